//! Locate the standings table inside a raw payload.
//!
//! Source layouts change without notice, so each content kind has an
//! ordered chain of locators. The first locator that yields at least one
//! entry wins; a miss on the primary is logged but not fatal. Only when the
//! whole chain comes up empty does extraction fail with `StructureNotFound`.

use scraper::{ElementRef, Html, Selector};
use serde_json::Value;
use tracing::{debug, info, warn};

use crate::data::models::{ContentKind, RawDocument, TeamEntry};
use crate::errors::StandingsError;

/// A named extraction strategy over a parsed payload.
pub struct Locator<T> {
    pub name: &'static str,
    pub locate: fn(&T) -> Vec<TeamEntry>,
}

/// Markup locators in priority order.
pub const MARKUP_LOCATORS: &[Locator<Html>] = &[
    Locator {
        name: "legacy-table",
        locate: legacy_table,
    },
    Locator {
        name: "standings-row",
        locate: standings_rows,
    },
    Locator {
        name: "generic-table",
        locate: generic_table,
    },
];

/// JSON locators in priority order.
pub const JSON_LOCATORS: &[Locator<Value>] = &[
    Locator {
        name: "standings-total",
        locate: standings_total,
    },
    Locator {
        name: "standings-first",
        locate: standings_first,
    },
    Locator {
        name: "league-standings",
        locate: league_standings,
    },
    Locator {
        name: "flat-table",
        locate: flat_table,
    },
];

/// Entries found by the winning locator.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Extraction {
    pub locator: &'static str,
    pub entries: Vec<TeamEntry>,
}

/// Extract raw team entries in standings order.
pub fn extract(doc: &RawDocument) -> Result<Extraction, StandingsError> {
    match doc.kind {
        ContentKind::Markup => {
            let html = Html::parse_document(&doc.body);
            run_chain(&html, MARKUP_LOCATORS)
        }
        ContentKind::Json => {
            let value = match serde_json::from_str::<Value>(&doc.body) {
                Ok(v) => v,
                Err(e) => {
                    warn!(error = %e, "Source payload is not valid JSON");
                    Value::Null
                }
            };
            run_chain(&value, JSON_LOCATORS)
        }
    }
}

fn run_chain<T>(input: &T, chain: &[Locator<T>]) -> Result<Extraction, StandingsError> {
    for (i, locator) in chain.iter().enumerate() {
        let mut entries = (locator.locate)(input);
        if entries.is_empty() {
            debug!(locator = locator.name, "Locator matched nothing");
            continue;
        }

        if i > 0 {
            warn!(
                locator = locator.name,
                primary = chain[0].name,
                "Primary locator missed; using fallback"
            );
        }

        // Only reorder when the source gave every row a position.
        if entries.iter().all(|e| e.rank.is_some()) {
            entries.sort_by_key(|e| e.rank);
        }

        info!(locator = locator.name, entries = entries.len(), "Standings located");
        return Ok(Extraction {
            locator: locator.name,
            entries,
        });
    }

    Err(StandingsError::StructureNotFound {
        locators_tried: chain.iter().map(|l| l.name).collect(),
    })
}

// =============================================================================
// Markup locators
// =============================================================================

fn selector(css: &str) -> Option<Selector> {
    Selector::parse(css).ok()
}

/// Visible text with whitespace runs collapsed.
fn element_text(el: ElementRef<'_>) -> String {
    el.text()
        .flat_map(str::split_whitespace)
        .collect::<Vec<_>>()
        .join(" ")
}

fn parse_rank(raw: &str) -> Option<u32> {
    raw.trim().trim_end_matches('.').parse().ok()
}

/// First `<tbody>`; rows tagged with `data-team-id`; name in `span.long`.
fn legacy_table(html: &Html) -> Vec<TeamEntry> {
    let (Some(tbody), Some(row), Some(long_name)) =
        (selector("tbody"), selector("tr"), selector("span.long"))
    else {
        return Vec::new();
    };
    let Some(body) = html.select(&tbody).next() else {
        return Vec::new();
    };

    body.select(&row)
        .filter(|r| r.value().attr("data-team-id").is_some())
        .filter_map(|r| {
            let name = r.select(&long_name).next().map(element_text)?;
            if name.is_empty() {
                return None;
            }
            Some(TeamEntry {
                name,
                rank: r.value().attr("data-position").and_then(parse_rank),
            })
        })
        .collect()
}

/// `tr.standings-row` with BEM-style name and position cells.
fn standings_rows(html: &Html) -> Vec<TeamEntry> {
    let (Some(row), Some(long_name), Some(short_name), Some(position)) = (
        selector("tr.standings-row"),
        selector(".standings-row__team-name-long"),
        selector(".standings-row__team-name"),
        selector(".standings-row__position"),
    ) else {
        return Vec::new();
    };

    html.select(&row)
        .filter_map(|r| {
            let name = r
                .select(&long_name)
                .next()
                .or_else(|| r.select(&short_name).next())
                .map(element_text)?;
            if name.is_empty() {
                return None;
            }
            let rank = r
                .select(&position)
                .next()
                .and_then(|p| parse_rank(&element_text(p)));
            Some(TeamEntry { name, rank })
        })
        .collect()
}

/// Any table body row with a team-name cell; rank from a numeric first cell.
fn generic_table(html: &Html) -> Vec<TeamEntry> {
    let (Some(row), Some(name_cell), Some(cell)) = (
        selector("table tbody tr"),
        selector("[class*=\"team-name\"], td.team"),
        selector("td"),
    ) else {
        return Vec::new();
    };

    html.select(&row)
        .filter_map(|r| {
            let name = r.select(&name_cell).next().map(element_text)?;
            if name.is_empty() {
                return None;
            }
            let rank = r
                .select(&cell)
                .next()
                .and_then(|c| parse_rank(&element_text(c)));
            Some(TeamEntry { name, rank })
        })
        .collect()
}

// =============================================================================
// JSON locators
// =============================================================================

fn json_rank(row: &Value, keys: &[&str]) -> Option<u32> {
    keys.iter().find_map(|k| match row.get(*k)? {
        Value::Number(n) => n.as_u64().and_then(|n| u32::try_from(n).ok()),
        Value::String(s) => parse_rank(s),
        _ => None,
    })
}

fn json_name(row: &Value, pointers: &[&str]) -> Option<String> {
    pointers.iter().find_map(|p| {
        let name = row.pointer(p)?.as_str()?.trim();
        (!name.is_empty()).then(|| name.to_string())
    })
}

/// Rows lacking a name are skipped rather than treated as errors.
fn rows_to_entries(rows: &[Value], rank_keys: &[&str], name_pointers: &[&str]) -> Vec<TeamEntry> {
    rows.iter()
        .filter_map(|row| {
            let name = json_name(row, name_pointers)?;
            Some(TeamEntry {
                name,
                rank: json_rank(row, rank_keys),
            })
        })
        .collect()
}

/// `standings[type == "TOTAL"].table[]` (football-data.org v4).
fn standings_total(value: &Value) -> Vec<TeamEntry> {
    let table = value
        .get("standings")
        .and_then(Value::as_array)
        .and_then(|groups| {
            groups
                .iter()
                .find(|g| g.get("type").and_then(Value::as_str) == Some("TOTAL"))
        })
        .and_then(|g| g.get("table"))
        .and_then(Value::as_array);

    match table {
        Some(rows) => rows_to_entries(rows, &["position"], &["/team/name"]),
        None => Vec::new(),
    }
}

/// First `standings[].table[]` without a `type` tag (or tagged `TOTAL`).
/// `HOME` and `AWAY` splits are never read as the league table.
fn standings_first(value: &Value) -> Vec<TeamEntry> {
    let table = value
        .get("standings")
        .and_then(Value::as_array)
        .and_then(|groups| {
            groups.iter().find(|g| {
                matches!(g.get("type").and_then(Value::as_str), None | Some("TOTAL"))
            })
        })
        .and_then(|g| g.get("table"))
        .and_then(Value::as_array);

    match table {
        Some(rows) => rows_to_entries(rows, &["position"], &["/team/name"]),
        None => Vec::new(),
    }
}

/// `response[0].league.standings[0][]` (API-Football v3).
fn league_standings(value: &Value) -> Vec<TeamEntry> {
    match value
        .pointer("/response/0/league/standings/0")
        .and_then(Value::as_array)
    {
        Some(rows) => rows_to_entries(rows, &["rank"], &["/team/name"]),
        None => Vec::new(),
    }
}

/// Top-level `table[]` or a bare array of rows.
fn flat_table(value: &Value) -> Vec<TeamEntry> {
    let rows = value
        .get("table")
        .and_then(Value::as_array)
        .or_else(|| value.as_array());

    match rows {
        Some(rows) => rows_to_entries(
            rows,
            &["position", "rank"],
            &["/team/name", "/team", "/teamName", "/name"],
        ),
        None => Vec::new(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn names(extraction: &Extraction) -> Vec<&str> {
        extraction.entries.iter().map(|e| e.name.as_str()).collect()
    }

    #[test]
    fn test_legacy_table_skips_rows_without_team_id_or_name() {
        let html = r#"
            <div class="tableContainer"><table><tbody>
              <tr data-team-id="1"><td><span class="long">Liverpool</span><span class="short">LIV</span></td></tr>
              <tr class="expandable"><td><span class="long">Not a team row</span></td></tr>
              <tr data-team-id="2"><td><span class="short">ARS</span></td></tr>
              <tr data-team-id="3"><td><span class="long"> Man City </span></td></tr>
            </tbody></table></div>"#;

        let out = extract(&RawDocument::markup(html)).unwrap();
        assert_eq!(out.locator, "legacy-table");
        assert_eq!(names(&out), vec!["Liverpool", "Man City"]);
        assert!(out.entries.iter().all(|e| e.rank.is_none()));
    }

    #[test]
    fn test_legacy_table_only_reads_first_tbody() {
        let html = r#"<table>
            <tbody><tr data-team-id="1"><td><span class="long">Arsenal</span></td></tr></tbody>
            <tbody><tr data-team-id="2"><td><span class="long">Chelsea</span></td></tr></tbody>
        </table>"#;

        let out = extract(&RawDocument::markup(html)).unwrap();
        assert_eq!(names(&out), vec!["Arsenal"]);
    }

    #[test]
    fn test_falls_back_to_standings_rows_and_sorts_by_position() {
        let html = r#"<table><thead><tr><th>Pos</th></tr></thead><tbody>
            <tr class="standings-row"><td class="standings-row__position">2</td>
                <td><span class="standings-row__team-name-long">Arsenal</span></td></tr>
            <tr class="standings-row"><td class="standings-row__position">1</td>
                <td><span class="standings-row__team-name">Liverpool</span></td></tr>
            <tr class="standings-row"><td class="standings-row__position">3</td></tr>
        </tbody></table>"#;

        let out = extract(&RawDocument::markup(html)).unwrap();
        assert_eq!(out.locator, "standings-row");
        assert_eq!(names(&out), vec!["Liverpool", "Arsenal"]);
        assert_eq!(out.entries[0].rank, Some(1));
    }

    #[test]
    fn test_generic_table_fallback() {
        let html = r#"<table><tbody>
            <tr><td>1.</td><td class="team"><img alt=""> Man City</td></tr>
            <tr><td>2.</td><td class="club-team-name">Arsenal</td></tr>
        </tbody></table>"#;

        let out = extract(&RawDocument::markup(html)).unwrap();
        assert_eq!(out.locator, "generic-table");
        assert_eq!(names(&out), vec!["Man City", "Arsenal"]);
        assert_eq!(out.entries[1].rank, Some(2));
    }

    #[test]
    fn test_partial_ranks_keep_encounter_order() {
        let html = r#"<table><tbody>
            <tr class="standings-row"><td class="standings-row__position">5</td>
                <td class="standings-row__team-name">Chelsea</td></tr>
            <tr class="standings-row"><td class="standings-row__position">-</td>
                <td class="standings-row__team-name">Fulham</td></tr>
        </tbody></table>"#;

        let out = extract(&RawDocument::markup(html)).unwrap();
        assert_eq!(names(&out), vec!["Chelsea", "Fulham"]);
    }

    #[test]
    fn test_markup_without_structure_fails() {
        let err = extract(&RawDocument::markup("<html><body><p>Maintenance</p></body></html>"))
            .unwrap_err();
        match err {
            StandingsError::StructureNotFound { locators_tried } => {
                assert_eq!(
                    locators_tried,
                    vec!["legacy-table", "standings-row", "generic-table"]
                );
            }
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn test_football_data_total_table_sorted_by_position() {
        let body = serde_json::json!({
            "standings": [
                {"type": "HOME", "table": [{"position": 1, "team": {"name": "Chelsea FC"}}]},
                {"type": "TOTAL", "table": [
                    {"position": 2, "team": {"name": "Arsenal FC"}},
                    {"position": 1, "team": {"name": "Liverpool FC"}},
                    {"position": 3, "team": {"shortName": "Spurs"}},
                ]},
            ]
        });

        let out = extract(&RawDocument::json(body.to_string())).unwrap();
        assert_eq!(out.locator, "standings-total");
        assert_eq!(names(&out), vec!["Liverpool FC", "Arsenal FC"]);
    }

    #[test]
    fn test_untyped_standings_use_first_group() {
        let body = serde_json::json!({
            "standings": [{"table": [{"position": "1", "team": {"name": "Arsenal"}}]}]
        });

        let out = extract(&RawDocument::json(body.to_string())).unwrap();
        assert_eq!(out.locator, "standings-first");
        assert_eq!(out.entries, vec![TeamEntry::ranked("Arsenal", 1)]);
    }

    #[test]
    fn test_home_and_away_splits_are_not_the_table() {
        let body = serde_json::json!({
            "standings": [
                {"type": "HOME", "table": [{"position": 1, "team": {"name": "Chelsea FC"}}]},
                {"type": "AWAY", "table": [{"position": 1, "team": {"name": "Fulham FC"}}]},
                {"type": "TOTAL", "table": [{"position": 1, "team": {"shortName": "Spurs"}}]},
            ]
        });

        let err = extract(&RawDocument::json(body.to_string())).unwrap_err();
        assert!(matches!(err, StandingsError::StructureNotFound { .. }));
    }

    #[test]
    fn test_api_football_shape() {
        let body = serde_json::json!({
            "response": [{"league": {"standings": [[
                {"rank": 2, "team": {"name": "Manchester City"}},
                {"rank": 1, "team": {"name": "Arsenal"}},
            ]]}}]
        });

        let out = extract(&RawDocument::json(body.to_string())).unwrap();
        assert_eq!(out.locator, "league-standings");
        assert_eq!(names(&out), vec!["Arsenal", "Manchester City"]);
    }

    #[test]
    fn test_flat_array_with_mixed_name_fields() {
        let body = serde_json::json!([
            {"teamName": "Arsenal"},
            {"team": "Chelsea"},
            {"name": "Fulham"},
            {"points": 3},
        ]);

        let out = extract(&RawDocument::json(body.to_string())).unwrap();
        assert_eq!(out.locator, "flat-table");
        assert_eq!(names(&out), vec!["Arsenal", "Chelsea", "Fulham"]);
    }

    #[test]
    fn test_invalid_json_is_structure_not_found() {
        let err = extract(&RawDocument::json("<html>blocked</html>")).unwrap_err();
        assert_eq!(err.stage(), "extract");
    }
}
