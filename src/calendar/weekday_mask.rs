use serde::{Deserialize, Serialize};

use super::CalendarDate;

/// Short weekday names indexed like the mask bits (0 = Sunday).
pub const DAY_LABELS: [&str; 7] = ["Sun", "Mon", "Tue", "Wed", "Thu", "Fri", "Sat"];

const DAY_NAMES: [&str; 7] = [
    "sunday", "monday", "tuesday", "wednesday", "thursday", "friday", "saturday",
];

/// Days of the week a recurring task is active on. Bit `i` is weekday `i`
/// counted from Sunday; this is the integer the API stores as `days_mask`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct WeekdayMask(u8);

impl WeekdayMask {
    pub const fn from_bits(bits: u8) -> Self { Self(bits) }
    pub const fn bits(self) -> u8 { self.0 }

    pub fn encode(flags: [bool; 7]) -> Self {
        Self(flags.iter().enumerate()
            .fold(0u8, |acc, (i, &on)| if on { acc | (1u8 << i) } else { acc }))
    }

    /// Only bits 0..=6 are inspected.
    pub fn decode(self) -> [bool; 7] {
        std::array::from_fn(|i| self.0 & (1u8 << i) != 0)
    }

    pub fn is_empty(self) -> bool {
        self.0 & 0x7f == 0
    }

    pub fn recurs_on(self, date: CalendarDate) -> bool {
        self.decode()[date.weekday_from_sunday() as usize]
    }

    /// Parses a comma separated list such as `mon,wed,fri`, or a raw mask
    /// integer below 128. Each name is a three-letter abbreviation or the full
    /// day name, in any case.
    pub fn parse_days(list: &str) -> Option<Self> {
        if let Ok(bits) = list.trim().parse::<u8>() {
            return (bits < 0x80).then(|| Self::from_bits(bits));
        }
        let mut flags = [false; 7];
        for name in list.split(',').map(str::trim).filter(|s| !s.is_empty()) {
            let name = name.to_ascii_lowercase();
            let idx = DAY_NAMES.iter()
                .position(|full| name == *full || (name.len() == 3 && full.starts_with(name.as_str())))?;
            flags[idx] = true;
        }
        Some(Self::encode(flags))
    }

    /// `"Mon Wed"`, or `"(none)"` for an empty mask.
    pub fn labels(self) -> String {
        let names: Vec<&str> = self.decode().iter().zip(DAY_LABELS)
            .filter_map(|(&on, label)| on.then_some(label))
            .collect();
        if names.is_empty() { "(none)".to_owned() } else { names.join(" ") }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn every_mask_round_trips() {
        for m in 0u8..=127 {
            assert_eq!(WeekdayMask::encode(WeekdayMask::from_bits(m).decode()).bits(), m);
        }
    }

    #[test]
    fn every_flag_tuple_round_trips() {
        for m in 0u8..=127 {
            let flags: [bool; 7] = std::array::from_fn(|i| m & (1u8 << i) != 0);
            assert_eq!(WeekdayMask::encode(flags).decode(), flags);
        }
    }

    #[test]
    fn high_bit_is_ignored() {
        let mask = WeekdayMask::from_bits(0b1000_0001);
        assert_eq!(mask.decode(), [true, false, false, false, false, false, false]);
        assert!(WeekdayMask::from_bits(0x80).is_empty());
    }

    #[test]
    fn sunday_is_bit_zero() {
        let sunday = CalendarDate::new(2024, 2, 17).unwrap();
        let monday = sunday.add_days(1).unwrap();
        let mask = WeekdayMask::encode([true, false, false, false, false, false, false]);
        assert!(mask.recurs_on(sunday));
        assert!(!mask.recurs_on(monday));
    }

    #[test]
    fn parses_and_labels_day_lists() {
        let mask = WeekdayMask::parse_days("mon, Wed,FRIDAY").unwrap();
        assert_eq!(mask.bits(), 0b010_1010);
        assert_eq!(mask.labels(), "Mon Wed Fri");
        assert!(WeekdayMask::parse_days("mo").is_none());
        assert!(WeekdayMask::parse_days("funday").is_none());
        for word in ["monkey", "satellite", "thunder", "tues", "wednes"] {
            assert!(WeekdayMask::parse_days(word).is_none(), "{word} is not a weekday");
        }
        assert_eq!(WeekdayMask::parse_days("Thursday,SUN").unwrap().labels(), "Sun Thu");
        assert_eq!(WeekdayMask::parse_days("65").unwrap().labels(), "Sun Sat");
        assert!(WeekdayMask::parse_days("200").is_none());
        assert_eq!(WeekdayMask::default().labels(), "(none)");
    }

    #[test]
    fn serializes_as_plain_integer() {
        assert_eq!(serde_json::to_string(&WeekdayMask::from_bits(65)).unwrap(), "65");
    }
}
