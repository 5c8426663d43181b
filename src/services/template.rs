//! `%{mode:field}` templates for event titles and descriptions.
//!
//! A template is tokenized once into literal text and placeholders, then
//! resolved against each triple. Anything that looks like a placeholder but
//! does not name a known mode and field is kept verbatim.

use crate::error::{AppError, AppResult};
use crate::services::matcher::SlotTriple;
use crate::services::schedule::{Mode, ScheduleSlot};

pub const DEFAULT_TITLE_FORMAT: &str =
    "%{regular:short_rule} / %{gachi:short_rule} / %{league:short_rule}";

pub const DEFAULT_DESCRIPTION_FORMAT: &str = "%{regular:rule}
* %{regular:map1}
* %{regular:map2}

%{gachi:rule}
* %{gachi:map1}
* %{gachi:map2}

%{league:rule}
* %{league:map1}
* %{league:map2}
";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Field {
    ShortRule,
    Rule,
    Map1,
    Map2,
}

impl Field {
    fn parse(s: &str) -> Option<Self> {
        match s {
            "short_rule" => Some(Field::ShortRule),
            "rule" => Some(Field::Rule),
            "map1" => Some(Field::Map1),
            "map2" => Some(Field::Map2),
            _ => None,
        }
    }

    fn resolve(&self, slot: &ScheduleSlot) -> String {
        match self {
            Field::ShortRule => slot.short_rule(),
            Field::Rule => slot.rule_ex.name.clone(),
            Field::Map1 => slot.map1().to_string(),
            Field::Map2 => slot.map2().to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Segment {
    Literal(String),
    Placeholder(Mode, Field),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Template {
    segments: Vec<Segment>,
}

fn parse_token(inner: &str) -> Option<(Mode, Field)> {
    let (mode, field) = inner.split_once(':')?;
    Some((Mode::parse(mode)?, Field::parse(field)?))
}

impl Template {
    pub fn parse(input: &str) -> Self {
        let mut segments = Vec::new();
        let mut literal = String::new();
        let mut rest = input;

        while let Some(pos) = rest.find("%{") {
            literal.push_str(&rest[..pos]);
            let after = &rest[pos + 2..];

            let token = after
                .find('}')
                .and_then(|end| parse_token(&after[..end]).map(|t| (end, t)));

            match token {
                Some((end, (mode, field))) => {
                    if !literal.is_empty() {
                        segments.push(Segment::Literal(std::mem::take(&mut literal)));
                    }
                    segments.push(Segment::Placeholder(mode, field));
                    rest = &after[end + 1..];
                }
                None => {
                    // not one of ours; keep the opener and rescan after it
                    literal.push_str("%{");
                    rest = after;
                }
            }
        }

        literal.push_str(rest);
        if !literal.is_empty() {
            segments.push(Segment::Literal(literal));
        }

        Self { segments }
    }

    /// Expand against a triple. Referencing a mode the triple has no slot for
    /// is an error.
    pub fn render(&self, triple: &SlotTriple<'_>) -> AppResult<String> {
        let mut out = String::new();
        for segment in &self.segments {
            match segment {
                Segment::Literal(text) => out.push_str(text),
                Segment::Placeholder(mode, field) => {
                    let slot = triple
                        .slot(*mode)
                        .ok_or_else(|| AppError::MissingCounterpart {
                            mode: *mode,
                            start_t: triple.start_t(),
                        })?;
                    out.push_str(&field.resolve(slot));
                }
            }
        }
        Ok(out)
    }
}

/// Title and description templates for one feed request.
#[derive(Debug, Clone)]
pub struct FormatSpec {
    pub title: Template,
    pub description: Template,
}

impl FormatSpec {
    pub fn new(title: Option<&str>, description: Option<&str>) -> Self {
        Self {
            title: Template::parse(title.unwrap_or(DEFAULT_TITLE_FORMAT)),
            description: Template::parse(description.unwrap_or(DEFAULT_DESCRIPTION_FORMAT)),
        }
    }
}

impl Default for FormatSpec {
    fn default() -> Self {
        Self::new(None, None)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::schedule::tests::slot;

    #[test]
    fn parses_literals_and_placeholders() {
        let t = Template::parse("[%{gachi:rule}] %{league:map2}!");
        assert_eq!(
            t.segments,
            vec![
                Segment::Literal("[".to_string()),
                Segment::Placeholder(Mode::Gachi, Field::Rule),
                Segment::Literal("] ".to_string()),
                Segment::Placeholder(Mode::League, Field::Map2),
                Segment::Literal("!".to_string()),
            ]
        );
    }

    #[test]
    fn unknown_tokens_pass_through() {
        let t = Template::parse("%{foo:bar} %{regular:weapon} %{regular:rule");
        assert_eq!(
            t.segments,
            vec![Segment::Literal(
                "%{foo:bar} %{regular:weapon} %{regular:rule".to_string()
            )]
        );
    }

    #[test]
    fn stray_opener_before_real_token() {
        let t = Template::parse("%{%{regular:map1}");
        assert_eq!(
            t.segments,
            vec![
                Segment::Literal("%{".to_string()),
                Segment::Placeholder(Mode::Regular, Field::Map1),
            ]
        );
    }

    #[test]
    fn renders_default_title() {
        let regular = slot(1, "ナワバリバトル", "turf_war", "ナワバリバトル");
        let gachi = slot(1, "ガチエリア", "splat_zones", "ガチエリア");
        let league = slot(1, "ガチホコバトル", "rainmaker", "ガチホコバトル");
        let triple = SlotTriple {
            regular: &regular,
            gachi: Some(&gachi),
            league: Some(&league),
        };

        let spec = FormatSpec::default();
        assert_eq!(
            spec.title.render(&triple).unwrap(),
            "ナワバリ / エリア / ホコ"
        );

        let description = spec.description.render(&triple).unwrap();
        assert!(description.starts_with("ナワバリバトル\n* バッテラストリート\n* フジツボスポーツクラブ\n\nガチエリア\n"));
        assert!(description.ends_with("ガチホコバトル\n* バッテラストリート\n* フジツボスポーツクラブ\n"));
    }

    #[test]
    fn missing_league_fails_only_when_referenced() {
        let regular = slot(1, "ナワバリバトル", "turf_war", "ナワバリバトル");
        let gachi = slot(1, "ガチヤグラ", "tower_control", "ガチヤグラ");
        let triple = SlotTriple {
            regular: &regular,
            gachi: Some(&gachi),
            league: None,
        };

        assert_eq!(
            Template::parse("%{regular:short_rule} / %{gachi:map1}").render(&triple).unwrap(),
            "ナワバリ / バッテラストリート"
        );

        match Template::parse("%{league:rule}").render(&triple) {
            Err(AppError::MissingCounterpart { mode, start_t }) => {
                assert_eq!(mode, Mode::League);
                assert_eq!(start_t, 1);
            }
            other => panic!("expected MissingCounterpart, got: {:?}", other),
        }
    }
}
