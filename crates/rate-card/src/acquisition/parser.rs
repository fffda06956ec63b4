use crate::pricing::{sanitize_amount, Location, LocationMap, RateTable, RoleRecord};
use serde_json::Value;
use std::io::Read;

/// Parse a spreadsheet CSV export. The header row is skipped and columns are
/// read by position: role, onshore, offshore, nearshore, optional client rate.
pub fn parse_csv<R: Read>(reader: R) -> Result<RateTable, csv::Error> {
    let mut csv_reader = csv::ReaderBuilder::new()
        .trim(csv::Trim::All)
        .flexible(true)
        .from_reader(reader);
    let mut records = Vec::new();

    for row in csv_reader.records() {
        let row = row?;
        let role = normalize_role(row.get(0).unwrap_or_default());
        if role.is_empty() {
            continue;
        }

        let amount = |index: usize| row.get(index).map(coerce_amount).unwrap_or(0.0);
        records.push(RoleRecord {
            role,
            costs: LocationMap {
                onshore: amount(1),
                offshore: amount(2),
                nearshore: amount(3),
            },
            client_rate: Some(amount(4)).filter(|rate| *rate > 0.0),
        });
    }

    Ok(RateTable::new(records))
}

/// Parse a JSON array of role objects. Both the nested shape
/// (`{"role", "clientRate", "onshore": {"cost"}}`) and the spreadsheet header
/// shape (`{"Role", "Onshore Cost/hr"}`) are accepted; anything other than an
/// array yields an empty table.
pub fn parse_json<R: Read>(reader: R) -> Result<RateTable, serde_json::Error> {
    let value: Value = serde_json::from_reader(reader)?;
    let records = match value {
        Value::Array(items) => items.iter().filter_map(record_from_json).collect(),
        _ => Vec::new(),
    };

    Ok(RateTable::new(records))
}

fn record_from_json(item: &Value) -> Option<RoleRecord> {
    let role = ["role", "Role"]
        .iter()
        .find_map(|key| item.get(*key))
        .and_then(Value::as_str)
        .map(normalize_role)
        .filter(|role| !role.is_empty())?;

    // A zero or missing nested cost falls through to the header column.
    let costs = LocationMap::from_fn(|location| {
        item.get(location.key())
            .and_then(|nested| nested.get("cost"))
            .map(json_amount)
            .filter(|cost| *cost > 0.0)
            .or_else(|| item.get(cost_header(location)).map(json_amount))
            .unwrap_or(0.0)
    });

    let client_rate = ["clientRate", "client_rate", "Client Rate/hr"]
        .iter()
        .filter_map(|key| item.get(*key))
        .map(json_amount)
        .find(|rate| *rate > 0.0);

    Some(RoleRecord {
        role,
        costs,
        client_rate,
    })
}

const fn cost_header(location: Location) -> &'static str {
    match location {
        Location::Onshore => "Onshore Cost/hr",
        Location::Offshore => "Offshore Cost/hr",
        Location::Nearshore => "Nearshore Cost/hr",
    }
}

fn json_amount(value: &Value) -> f64 {
    match value {
        Value::Number(number) => number.as_f64().map(sanitize_amount).unwrap_or(0.0),
        Value::String(raw) => coerce_amount(raw),
        _ => 0.0,
    }
}

/// Spreadsheet cells arrive as text; currency symbols and thousands separators
/// are tolerated and anything unparseable becomes the zero sentinel.
fn coerce_amount(raw: &str) -> f64 {
    let cleaned: String = raw
        .trim()
        .trim_matches('"')
        .chars()
        .filter(|ch| *ch != '$' && *ch != ',')
        .collect();
    cleaned
        .trim()
        .parse::<f64>()
        .map(sanitize_amount)
        .unwrap_or(0.0)
}

fn normalize_role(value: &str) -> String {
    let cleaned = value.replace(['\u{feff}', '\u{200b}', '"'], "");
    cleaned.split_whitespace().collect::<Vec<_>>().join(" ")
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    #[test]
    fn csv_reads_positional_columns_and_skips_header() {
        let csv = "Role,Onshore Cost/hr,Offshore Cost/hr,Nearshore Cost/hr\n\
Salesforce Solution Architect,100,34,47\n\
\"Junior  Developer\", 69 ,11,25\n";
        let table = parse_csv(Cursor::new(csv)).expect("parse");

        assert_eq!(table.len(), 2);
        let junior = table.find("Junior Developer").expect("normalized role");
        assert_eq!(junior.cost(Location::Onshore), 69.0);
        assert!(junior.client_rate.is_none());
    }

    #[test]
    fn csv_coerces_bad_cells_to_zero_and_reads_client_rate() {
        let csv = "Role,Onshore,Offshore,Nearshore,Client Rate\n\
QA -Quality Assurance,n/a,$6.75,-3,18\n\
Data/Integration Architect,\"1,129.00\",30\n\
,1,2,3\n";
        let table = parse_csv(Cursor::new(csv)).expect("parse");

        assert_eq!(table.len(), 2);
        let qa = table.find("QA -Quality Assurance").expect("qa");
        assert_eq!(qa.costs, LocationMap {
            onshore: 0.0,
            offshore: 6.75,
            nearshore: 0.0,
        });
        assert_eq!(qa.client_rate, Some(18.0));

        let architect = table.find("Data/Integration Architect").expect("architect");
        assert_eq!(architect.cost(Location::Onshore), 1129.0);
        assert_eq!(architect.cost(Location::Nearshore), 0.0);
    }

    #[test]
    fn header_only_csv_is_empty() {
        let table = parse_csv(Cursor::new("Role,Onshore,Offshore,Nearshore\n")).expect("parse");
        assert!(table.is_empty());
    }

    #[test]
    fn json_accepts_nested_and_header_shapes() {
        let json = r#"[
            {"role": "Release Manager", "clientRate": 160.0,
             "onshore": {"cost": 99.0}, "offshore": {"cost": "13.5"}, "nearshore": {"cost": 56}},
            {"Role": "Junior Developer", "Onshore Cost/hr": 69, "Offshore Cost/hr": "11",
             "Nearshore Cost/hr": null},
            {"role": "", "onshore": {"cost": 5}}
        ]"#;
        let table = parse_json(Cursor::new(json)).expect("parse");

        assert_eq!(table.len(), 2);
        let manager = table.find("Release Manager").expect("manager");
        assert_eq!(manager.cost(Location::Offshore), 13.5);
        assert_eq!(manager.client_rate, Some(160.0));

        let junior = table.find("Junior Developer").expect("junior");
        assert_eq!(junior.cost(Location::Offshore), 11.0);
        assert_eq!(junior.cost(Location::Nearshore), 0.0);
    }

    #[test]
    fn zero_nested_cost_falls_back_to_header_column() {
        let json = r#"[
            {"role": "Release Manager", "clientRate": 0, "Client Rate/hr": "$160",
             "onshore": {"cost": 0}, "Onshore Cost/hr": "99",
             "offshore": {"cost": 13.5}, "Offshore Cost/hr": 20}
        ]"#;
        let table = parse_json(Cursor::new(json)).expect("parse");

        let manager = table.find("Release Manager").expect("manager");
        assert_eq!(manager.cost(Location::Onshore), 99.0);
        assert_eq!(manager.cost(Location::Offshore), 13.5);
        assert_eq!(manager.cost(Location::Nearshore), 0.0);
        assert_eq!(manager.client_rate, Some(160.0));
    }

    #[test]
    fn json_object_payload_yields_empty_table() {
        let table = parse_json(Cursor::new(r#"{"role": "Solo"}"#)).expect("parse");
        assert!(table.is_empty());
    }

    #[test]
    fn malformed_json_is_an_error() {
        assert!(parse_json(Cursor::new("[{")).is_err());
    }
}
