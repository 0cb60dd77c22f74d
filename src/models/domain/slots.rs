use chrono::{FixedOffset, NaiveTime};
use once_cell::sync::Lazy;

/// All exam times are wall-clock IST, UTC+05:30.
pub static IST: Lazy<FixedOffset> =
    Lazy::new(|| FixedOffset::east_opt(5 * 3600 + 30 * 60).expect("IST offset is in range"));

/// A fixed daily exam window. The table is static configuration; a contest's
/// valid slots are the first `total_slots` entries.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct SlotWindow {
    pub id: &'static str,
    pub start: NaiveTime,
    pub end: NaiveTime,
}

static SLOT_TABLE: Lazy<Vec<SlotWindow>> = Lazy::new(|| {
    let window = |id, start_h, start_m, end_h, end_m| SlotWindow {
        id,
        start: NaiveTime::from_hms_opt(start_h, start_m, 0).expect("valid slot start"),
        end: NaiveTime::from_hms_opt(end_h, end_m, 0).expect("valid slot end"),
    };

    vec![
        window("Slot-1", 8, 0, 9, 0),
        window("Slot-2", 20, 0, 23, 30),
        window("Slot-3", 15, 0, 16, 0),
        window("Slot-4", 17, 0, 18, 0),
        window("Slot-5", 19, 0, 20, 0),
        window("Slot-6", 21, 0, 22, 0),
    ]
});

pub fn slot_window(slot_id: &str) -> Option<&'static SlotWindow> {
    SLOT_TABLE.iter().find(|slot| slot.id == slot_id)
}

pub fn contest_slots(total_slots: i64) -> &'static [SlotWindow] {
    let count = (total_slots.max(0) as usize).min(SLOT_TABLE.len());
    &SLOT_TABLE[..count]
}

pub fn is_valid_slot(slot_id: &str, total_slots: i64) -> bool {
    contest_slots(total_slots).iter().any(|slot| slot.id == slot_id)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn every_window_ends_after_it_starts() {
        for slot in SLOT_TABLE.iter() {
            assert!(slot.end > slot.start, "{} window is inverted", slot.id);
        }
    }

    #[test]
    fn slot_lookup_by_id() {
        let slot = slot_window("Slot-1").expect("Slot-1 exists");
        assert_eq!(slot.start, NaiveTime::from_hms_opt(8, 0, 0).unwrap());
        assert_eq!(slot.end, NaiveTime::from_hms_opt(9, 0, 0).unwrap());

        assert!(slot_window("Slot-99").is_none());
    }

    #[test]
    fn contest_slot_subset_respects_total() {
        assert_eq!(contest_slots(3).len(), 3);
        assert!(is_valid_slot("Slot-3", 3));
        assert!(!is_valid_slot("Slot-4", 3));

        // out-of-range totals clamp to the table
        assert_eq!(contest_slots(99).len(), 6);
        assert_eq!(contest_slots(-1).len(), 0);
    }
}
