use crate::services::schedule::{Mode, ScheduleSet, ScheduleSlot};

/// A regular slot together with the gachi and league slots starting at the
/// same time. Either counterpart may be missing.
#[derive(Debug, Clone, Copy)]
pub struct SlotTriple<'a> {
    pub regular: &'a ScheduleSlot,
    pub gachi: Option<&'a ScheduleSlot>,
    pub league: Option<&'a ScheduleSlot>,
}

impl<'a> SlotTriple<'a> {
    pub fn slot(&self, mode: Mode) -> Option<&'a ScheduleSlot> {
        match mode {
            Mode::Regular => Some(self.regular),
            Mode::Gachi => self.gachi,
            Mode::League => self.league,
        }
    }

    pub fn start_t(&self) -> i64 {
        self.regular.start_t
    }
}

// Duplicate start times are not an error: the first slot wins.
fn counterpart(slots: &[ScheduleSlot], start_t: i64) -> Option<&ScheduleSlot> {
    slots.iter().find(|s| s.start_t == start_t)
}

/// One triple per regular slot, in the order the regular slots appear.
pub fn triples(set: &ScheduleSet) -> impl Iterator<Item = SlotTriple<'_>> {
    set.regular.iter().map(|regular| SlotTriple {
        regular,
        gachi: counterpart(&set.gachi, regular.start_t),
        league: counterpart(&set.league, regular.start_t),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::schedule::tests::slot;

    #[test]
    fn pairs_by_start_time_and_keeps_regular_order() {
        let set = ScheduleSet {
            regular: vec![
                slot(300, "ナワバリバトル", "turf_war", "ナワバリバトル"),
                slot(100, "ナワバリバトル", "turf_war", "ナワバリバトル"),
            ],
            gachi: vec![
                slot(100, "ガチエリア", "splat_zones", "ガチエリア"),
                slot(300, "ガチホコバトル", "rainmaker", "ガチホコバトル"),
            ],
            league: vec![slot(300, "ガチアサリ", "clam_blitz", "ガチアサリ")],
        };

        let triples: Vec<_> = triples(&set).collect();
        assert_eq!(triples.len(), 2);
        assert_eq!(triples[0].start_t(), 300);
        assert_eq!(triples[0].gachi.unwrap().rule_ex.key, "rainmaker");
        assert_eq!(triples[0].league.unwrap().rule_ex.key, "clam_blitz");
        assert_eq!(triples[1].start_t(), 100);
        assert_eq!(triples[1].gachi.unwrap().rule_ex.key, "splat_zones");
        assert!(triples[1].league.is_none());
    }

    #[test]
    fn missing_counterpart_is_absent_not_error() {
        let set = ScheduleSet {
            regular: vec![slot(1, "ナワバリバトル", "turf_war", "ナワバリバトル")],
            gachi: vec![slot(1, "ガチヤグラ", "tower_control", "ガチヤグラ")],
            league: vec![],
        };

        let triple = triples(&set).next().unwrap();
        assert!(triple.slot(Mode::Gachi).is_some());
        assert!(triple.slot(Mode::League).is_none());
    }

    #[test]
    fn first_match_wins_on_duplicate_start() {
        let set = ScheduleSet {
            regular: vec![slot(5, "ナワバリバトル", "turf_war", "ナワバリバトル")],
            gachi: vec![],
            league: vec![
                slot(5, "ガチエリア", "splat_zones", "ガチエリア"),
                slot(5, "ガチヤグラ", "tower_control", "ガチヤグラ"),
            ],
        };

        let triple = triples(&set).next().unwrap();
        assert_eq!(triple.league.unwrap().rule_ex.key, "splat_zones");
    }
}
