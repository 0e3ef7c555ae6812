//! Processed dataset CSV
//!
//! The dataset file is schema-stable: a fixed column set in a fixed order,
//! rows sorted by identifier (the Dataset guarantees that). Quoting follows
//! RFC 4180: a cell is quoted only when it needs to be, with embedded
//! quotes doubled, so unchanged data always serializes to identical bytes.

use crate::dataset::Dataset;
use crate::model::{Address, Contact, Coordinates, ServiceCategory, ServiceLocation};
use crate::WriteError;
use chrono::{DateTime, Utc};
use std::io::{BufWriter, Write};
use std::mem::take;
use std::path::Path;

/// The dataset's column set, in order.
pub const COLUMNS: [&str; 16] = [
    "id",
    "name",
    "address",
    "street",
    "suburb",
    "state",
    "postcode",
    "latitude",
    "longitude",
    "categories",
    "phone",
    "email",
    "hours",
    "needs_review",
    "source_url",
    "last_seen",
];

/// Writes the dataset to `path`.
pub fn write_dataset(path: &Path, dataset: &Dataset) -> Result<(), WriteError> {
    let file = std::fs::File::create(path).map_err(|e| io_error(path, e))?;
    let mut writer = BufWriter::new(file);

    write_row(
        &mut writer,
        &COLUMNS.iter().map(|c| c.to_string()).collect::<Vec<_>>(),
    )
    .map_err(|e| io_error(path, e))?;

    for location in dataset.iter() {
        write_row(&mut writer, &encode_row(location)).map_err(|e| io_error(path, e))?;
    }

    writer.flush().map_err(|e| io_error(path, e))?;
    Ok(())
}

/// Reads a previously written dataset back.
pub fn read_dataset(path: &Path) -> Result<Dataset, WriteError> {
    let content = std::fs::read_to_string(path).map_err(|e| io_error(path, e))?;
    let mut rows = parse_rows(&content).into_iter();

    let header = rows.next().ok_or_else(|| WriteError::PreviousDataset {
        path: path.display().to_string(),
        reason: "empty file".to_string(),
    })?;
    if header != COLUMNS {
        return Err(WriteError::PreviousDataset {
            path: path.display().to_string(),
            reason: format!("unexpected header: {:?}", header),
        });
    }

    let mut dataset = Dataset::new();
    for (line_no, row) in rows.enumerate() {
        let location = decode_row(&row).map_err(|reason| WriteError::PreviousDataset {
            path: path.display().to_string(),
            reason: format!("row {}: {}", line_no + 2, reason),
        })?;
        dataset.insert(location);
    }

    Ok(dataset)
}

fn encode_row(location: &ServiceLocation) -> Vec<String> {
    let opt = |value: &Option<String>| value.clone().unwrap_or_default();

    vec![
        location.id.clone(),
        location.name.clone(),
        location.address.raw.clone(),
        opt(&location.address.street),
        opt(&location.address.suburb),
        opt(&location.address.state),
        opt(&location.address.postcode),
        location
            .coordinates
            .map(|c| c.latitude.to_string())
            .unwrap_or_default(),
        location
            .coordinates
            .map(|c| c.longitude.to_string())
            .unwrap_or_default(),
        location
            .categories
            .iter()
            .map(|c| c.code())
            .collect::<Vec<_>>()
            .join(";"),
        opt(&location.contact.phone),
        opt(&location.contact.email),
        opt(&location.hours),
        location.needs_review.to_string(),
        location.source_url.clone(),
        location.last_seen.to_rfc3339(),
    ]
}

fn decode_row(row: &[String]) -> Result<ServiceLocation, String> {
    if row.len() != COLUMNS.len() {
        return Err(format!("expected {} cells, got {}", COLUMNS.len(), row.len()));
    }

    let cell = |index: usize| row[index].as_str();
    let optional = |index: usize| {
        let value = cell(index);
        if value.is_empty() {
            None
        } else {
            Some(value.to_string())
        }
    };

    let coordinates = match (cell(7), cell(8)) {
        ("", "") => None,
        (lat, lon) => Some(Coordinates {
            latitude: lat.parse().map_err(|_| format!("bad latitude '{}'", lat))?,
            longitude: lon.parse().map_err(|_| format!("bad longitude '{}'", lon))?,
        }),
    };

    let categories: Vec<ServiceCategory> = cell(9)
        .split(';')
        .filter(|code| !code.is_empty())
        .map(ServiceCategory::from_code)
        .collect();

    let needs_review = match cell(13) {
        "true" => true,
        "false" => false,
        other => return Err(format!("bad needs_review '{}'", other)),
    };

    let last_seen = DateTime::parse_from_rfc3339(cell(15))
        .map_err(|e| format!("bad last_seen '{}': {}", cell(15), e))?
        .with_timezone(&Utc);

    Ok(ServiceLocation {
        id: cell(0).to_string(),
        name: cell(1).to_string(),
        address: Address {
            raw: cell(2).to_string(),
            street: optional(3),
            suburb: optional(4),
            state: optional(5),
            postcode: optional(6),
        },
        coordinates,
        categories,
        contact: Contact {
            phone: optional(10),
            email: optional(11),
        },
        hours: optional(12),
        needs_review,
        source_url: cell(14).to_string(),
        last_seen,
    })
}

/// Writes one CSV row, quoting only cells that need it.
fn write_row<W: Write>(writer: &mut W, row: &[String]) -> std::io::Result<()> {
    let mut first = true;
    for cell in row {
        if !first {
            write!(writer, ",")?;
        } else {
            first = false;
        }
        if needs_quotes(cell) {
            write!(writer, "\"{}\"", cell.replace('"', "\"\""))?;
        } else {
            write!(writer, "{}", cell)?;
        }
    }
    writeln!(writer)
}

fn needs_quotes(cell: &str) -> bool {
    cell.contains(',') || cell.contains('"') || cell.contains('\n') || cell.contains('\r')
}

/// Minimal CSV parser: quotes and CRLF tolerant, nothing more.
fn parse_rows(text: &str) -> Vec<Vec<String>> {
    let mut rows = Vec::new();
    let mut row: Vec<String> = Vec::new();
    let mut field = String::new();
    let mut in_quotes = false;
    let mut chars = text.chars().peekable();

    while let Some(ch) = chars.next() {
        match ch {
            '"' => {
                if in_quotes {
                    if matches!(chars.peek(), Some('"')) {
                        chars.next();
                        field.push('"');
                    } else {
                        in_quotes = false;
                    }
                } else {
                    in_quotes = true;
                }
            }
            ',' if !in_quotes => row.push(take(&mut field)),
            '\n' | '\r' if !in_quotes => {
                if ch == '\r' && matches!(chars.peek(), Some('\n')) {
                    chars.next();
                }
                row.push(take(&mut field));
                if !(row.len() == 1 && row[0].is_empty()) {
                    rows.push(take(&mut row));
                } else {
                    row.clear();
                }
            }
            _ => field.push(ch),
        }
    }

    // Trailing row without a final newline
    if !field.is_empty() || !row.is_empty() {
        row.push(field);
        rows.push(row);
    }

    rows
}

fn io_error(path: &Path, source: std::io::Error) -> WriteError {
    WriteError::Io {
        path: path.display().to_string(),
        source,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn sample_location(id: &str) -> ServiceLocation {
        ServiceLocation {
            id: id.to_string(),
            name: "Darra Transfer Station".to_string(),
            address: Address {
                street: Some("21 Kimberley St".to_string()),
                suburb: Some("Darra".to_string()),
                state: Some("QLD".to_string()),
                postcode: Some("4076".to_string()),
                raw: "21 Kimberley St, Darra QLD 4076".to_string(),
            },
            coordinates: Some(Coordinates {
                latitude: -27.563,
                longitude: 152.954,
            }),
            categories: vec![
                ServiceCategory::GeneralWaste,
                ServiceCategory::Other("Tyre Disposal".to_string()),
            ],
            contact: Contact {
                phone: Some("07 3333 4444".to_string()),
                email: Some("darra@example.com".to_string()),
            },
            hours: Some("Mon-Fri 07:00-16:00".to_string()),
            needs_review: false,
            source_url: "https://example.com/locations/darra/".to_string(),
            last_seen: Utc.with_ymd_and_hms(2026, 8, 7, 3, 30, 0).unwrap(),
        }
    }

    #[test]
    fn test_write_and_read_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("locations.csv");

        let mut dataset = Dataset::new();
        dataset.insert(sample_location("SVCaaa"));
        dataset.insert(sample_location("SVCbbb"));

        write_dataset(&path, &dataset).unwrap();
        let loaded = read_dataset(&path).unwrap();

        assert_eq!(loaded.len(), 2);
        let original = dataset.get("SVCaaa").unwrap();
        let restored = loaded.get("SVCaaa").unwrap();
        assert!(original.same_content(restored));
        assert_eq!(original.last_seen, restored.last_seen);
    }

    #[test]
    fn test_quoted_cells_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("locations.csv");

        let mut location = sample_location("SVCq");
        location.name = "Depot \"North\", Stage 2".to_string();

        let mut dataset = Dataset::new();
        dataset.insert(location.clone());

        write_dataset(&path, &dataset).unwrap();
        let loaded = read_dataset(&path).unwrap();
        assert_eq!(loaded.get("SVCq").unwrap().name, location.name);
    }

    #[test]
    fn test_header_is_stable() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("locations.csv");
        write_dataset(&path, &Dataset::new()).unwrap();

        let content = std::fs::read_to_string(&path).unwrap();
        assert_eq!(
            content.lines().next().unwrap(),
            "id,name,address,street,suburb,state,postcode,latitude,longitude,categories,phone,email,hours,needs_review,source_url,last_seen"
        );
    }

    #[test]
    fn test_unchanged_dataset_writes_identical_bytes() {
        let dir = tempfile::tempdir().unwrap();
        let path_a = dir.path().join("a.csv");
        let path_b = dir.path().join("b.csv");

        let mut dataset = Dataset::new();
        dataset.insert(sample_location("SVCaaa"));

        write_dataset(&path_a, &dataset).unwrap();
        let reloaded = read_dataset(&path_a).unwrap();
        write_dataset(&path_b, &reloaded).unwrap();

        assert_eq!(
            std::fs::read(&path_a).unwrap(),
            std::fs::read(&path_b).unwrap()
        );
    }

    #[test]
    fn test_rejects_unexpected_header() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("bad.csv");
        std::fs::write(&path, "id,name\nSVCx,Depot\n").unwrap();

        let err = read_dataset(&path).unwrap_err();
        assert!(matches!(err, WriteError::PreviousDataset { .. }));
    }

    #[test]
    fn test_rejects_malformed_row() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("bad.csv");
        let header = COLUMNS.join(",");
        std::fs::write(&path, format!("{}\nonly,two\n", header)).unwrap();

        assert!(read_dataset(&path).is_err());
    }

    #[test]
    fn test_parse_rows_handles_quotes_and_crlf() {
        let rows = parse_rows("a,\"b,1\",c\r\nd,\"say \"\"hi\"\"\",f\r\n");
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0], vec!["a", "b,1", "c"]);
        assert_eq!(rows[1], vec!["d", "say \"hi\"", "f"]);
    }
}
