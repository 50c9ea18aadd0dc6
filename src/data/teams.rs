//! Source spelling → canonical display name.
//!
//! The table covers the spellings used by the official Premier League site,
//! football-data.org and API-Football for current and recently relegated
//! clubs. Canonical names map to themselves so sources that already use
//! them pass through.

/// (source spelling, canonical name). Never mutated at runtime.
pub const NAME_MAPPING_TABLE: &[(&str, &str)] = &[
    // Arsenal
    ("Arsenal", "Arsenal"),
    ("Arsenal FC", "Arsenal"),
    // Aston Villa
    ("Aston Villa", "Aston Villa"),
    ("Aston Villa FC", "Aston Villa"),
    ("Villa", "Aston Villa"),
    // Bournemouth
    ("Bournemouth", "Bournemouth"),
    ("AFC Bournemouth", "Bournemouth"),
    // Brentford
    ("Brentford", "Brentford"),
    ("Brentford FC", "Brentford"),
    // Brighton
    ("Brighton & Hove Albion", "Brighton & Hove Albion"),
    ("Brighton & Hove Albion FC", "Brighton & Hove Albion"),
    ("Brighton and Hove Albion", "Brighton & Hove Albion"),
    ("Brighton Hove", "Brighton & Hove Albion"),
    ("Brighton", "Brighton & Hove Albion"),
    // Burnley
    ("Burnley", "Burnley"),
    ("Burnley FC", "Burnley"),
    // Chelsea
    ("Chelsea", "Chelsea"),
    ("Chelsea FC", "Chelsea"),
    // Crystal Palace
    ("Crystal Palace", "Crystal Palace"),
    ("Crystal Palace FC", "Crystal Palace"),
    // Everton
    ("Everton", "Everton"),
    ("Everton FC", "Everton"),
    // Fulham
    ("Fulham", "Fulham"),
    ("Fulham FC", "Fulham"),
    // Ipswich
    ("Ipswich Town", "Ipswich Town"),
    ("Ipswich Town FC", "Ipswich Town"),
    ("Ipswich", "Ipswich Town"),
    // Leeds
    ("Leeds United", "Leeds United"),
    ("Leeds United FC", "Leeds United"),
    ("Leeds", "Leeds United"),
    // Leicester
    ("Leicester City", "Leicester City"),
    ("Leicester City FC", "Leicester City"),
    ("Leicester", "Leicester City"),
    // Liverpool
    ("Liverpool", "Liverpool"),
    ("Liverpool FC", "Liverpool"),
    // Luton
    ("Luton Town", "Luton Town"),
    ("Luton Town FC", "Luton Town"),
    ("Luton", "Luton Town"),
    // Manchester City
    ("Manchester City", "Manchester City"),
    ("Manchester City FC", "Manchester City"),
    ("Man City", "Manchester City"),
    // Manchester United
    ("Manchester United", "Manchester United"),
    ("Manchester United FC", "Manchester United"),
    ("Man United", "Manchester United"),
    ("Man Utd", "Manchester United"),
    // Newcastle
    ("Newcastle United", "Newcastle United"),
    ("Newcastle United FC", "Newcastle United"),
    ("Newcastle", "Newcastle United"),
    // Nottingham Forest
    ("Nottingham Forest", "Nottingham Forest"),
    ("Nottingham Forest FC", "Nottingham Forest"),
    ("Nott'm Forest", "Nottingham Forest"),
    ("Nottingham", "Nottingham Forest"),
    // Sheffield United
    ("Sheffield United", "Sheffield United"),
    ("Sheffield United FC", "Sheffield United"),
    ("Sheffield Utd", "Sheffield United"),
    // Southampton
    ("Southampton", "Southampton"),
    ("Southampton FC", "Southampton"),
    // Sunderland
    ("Sunderland", "Sunderland"),
    ("Sunderland AFC", "Sunderland"),
    // Tottenham
    ("Tottenham Hotspur", "Tottenham Hotspur"),
    ("Tottenham Hotspur FC", "Tottenham Hotspur"),
    ("Tottenham", "Tottenham Hotspur"),
    ("Spurs", "Tottenham Hotspur"),
    // West Ham
    ("West Ham United", "West Ham United"),
    ("West Ham United FC", "West Ham United"),
    ("West Ham", "West Ham United"),
    // Wolves
    ("Wolverhampton Wanderers", "Wolverhampton Wanderers"),
    ("Wolverhampton Wanderers FC", "Wolverhampton Wanderers"),
    ("Wolverhampton", "Wolverhampton Wanderers"),
    ("Wolves", "Wolverhampton Wanderers"),
];

/// Map a source spelling to its canonical name.
///
/// Exact match on the trimmed input. Unknown names return `None`; callers
/// drop them and leave the count check to catch the shortfall.
pub fn normalize(raw_name: &str) -> Option<&'static str> {
    let trimmed = raw_name.trim();
    NAME_MAPPING_TABLE
        .iter()
        .find(|(source, _)| *source == trimmed)
        .map(|(_, canonical)| *canonical)
}

/// Whether `name` is one of the canonical display names.
pub fn is_canonical(name: &str) -> bool {
    NAME_MAPPING_TABLE
        .iter()
        .any(|(_, canonical)| *canonical == name)
}

/// Result of normalizing a whole sequence of source names.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Normalized {
    /// Canonical names in source order.
    pub names: Vec<String>,
    /// Raw names with no table entry, in source order.
    pub dropped: Vec<String>,
}

/// Normalize every name in order, separating out the unrecognized ones.
pub fn normalize_all<'a, I>(raw_names: I) -> Normalized
where
    I: IntoIterator<Item = &'a str>,
{
    let mut out = Normalized::default();
    for raw in raw_names {
        match normalize(raw) {
            Some(canonical) => out.names.push(canonical.to_string()),
            None => out.dropped.push(raw.trim().to_string()),
        }
    }
    out
}
