//! Line-oriented record codec for the `.dat` files.
//!
//! One record per line, comma-delimited. Fields that contain a comma or quote are quoted, so
//! plain records stay byte-compatible with files written by older releases. Older releases wrote
//! quotes unescaped: a line that does not parse as quoted CSV with the expected field count but
//! contains `"` is split on bare commas instead. An unescaped field that happens to form valid
//! quoting (`"abc"` as a whole field) is still read as quoted.

use std::io::{BufRead, BufReader, Read, Write};

use csv::StringRecord;

use super::domain::{Account, Application, ApplicationId, ApplicationStatus, Pet, Role, User};

pub const NEXT_ID_PREFIX: &str = "NEXT_ID:";

/// Errors raised while encoding or decoding records.
#[derive(Debug, thiserror::Error)]
pub enum CodecError {
    #[error("invalid record on line {line}: {reason}")]
    InvalidFormat { line: u64, reason: String },
    #[error("csv error: {0}")]
    Csv(#[from] csv::Error),
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
    #[error("encoded record is not valid utf-8")]
    Utf8(#[from] std::string::FromUtf8Error),
}

/// A persisted record with a fixed positional field layout.
pub trait Record: Sized {
    const FIELDS: usize;

    fn to_fields(&self) -> Vec<String>;

    /// Rebuild the record from exactly `FIELDS` fields, returning a reason on failure.
    fn from_fields(fields: &StringRecord) -> Result<Self, String>;
}

fn encode_flag(value: bool) -> String {
    let token = if value { "1" } else { "0" };
    token.to_string()
}

fn decode_flag(value: &str, field: &str) -> Result<bool, String> {
    match value {
        "0" => Ok(false),
        "1" => Ok(true),
        other => Err(format!("{field} must be 0 or 1, found '{other}'")),
    }
}

fn decode_number<T: std::str::FromStr>(value: &str, field: &str) -> Result<T, String> {
    value
        .parse()
        .map_err(|_| format!("{field} must be a non-negative integer, found '{value}'"))
}

impl Record for Pet {
    const FIELDS: usize = 5;

    fn to_fields(&self) -> Vec<String> {
        vec![
            self.name.clone(),
            self.breed.clone(),
            self.age.to_string(),
            encode_flag(self.vaccinated),
            encode_flag(self.adopted),
        ]
    }

    fn from_fields(fields: &StringRecord) -> Result<Self, String> {
        Ok(Self {
            name: fields[0].to_string(),
            breed: fields[1].to_string(),
            age: decode_number(&fields[2], "age")?,
            vaccinated: decode_flag(&fields[3], "vaccinated")?,
            adopted: decode_flag(&fields[4], "adopted")?,
        })
    }
}

impl Record for Application {
    const FIELDS: usize = 4;

    fn to_fields(&self) -> Vec<String> {
        vec![
            self.id.0.to_string(),
            self.username.clone(),
            self.pet_name.clone(),
            self.status.label().to_string(),
        ]
    }

    fn from_fields(fields: &StringRecord) -> Result<Self, String> {
        let status = ApplicationStatus::from_label(&fields[3])
            .ok_or_else(|| format!("unknown application status '{}'", &fields[3]))?;

        Ok(Self {
            id: ApplicationId(decode_number(&fields[0], "id")?),
            username: fields[1].to_string(),
            pet_name: fields[2].to_string(),
            status,
        })
    }
}

impl Record for User {
    const FIELDS: usize = 3;

    fn to_fields(&self) -> Vec<String> {
        vec![
            self.username().to_string(),
            self.password().to_string(),
            self.role().code().to_string(),
        ]
    }

    fn from_fields(fields: &StringRecord) -> Result<Self, String> {
        let code: u8 = decode_number(&fields[2], "role")?;
        let role = Role::from_code(code).ok_or_else(|| format!("unknown role code {code}"))?;
        Ok(User::with_role(role, Account::new(&fields[0], &fields[1])))
    }
}

fn decode_record<T: Record>(record: &StringRecord, line: u64) -> Result<T, CodecError> {
    if record.len() != T::FIELDS {
        return Err(CodecError::InvalidFormat {
            line,
            reason: format!("expected {} fields, found {}", T::FIELDS, record.len()),
        });
    }
    T::from_fields(record).map_err(|reason| CodecError::InvalidFormat { line, reason })
}

fn writer_for<W: Write>(writer: W) -> csv::Writer<W> {
    csv::WriterBuilder::new()
        .has_headers(false)
        .terminator(csv::Terminator::Any(b'\n'))
        .from_writer(writer)
}

fn reader_for<R: Read>(reader: R) -> csv::Reader<R> {
    csv::ReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .from_reader(reader)
}

/// Serialize a single record to one line, without the trailing newline.
pub fn encode_line<T: Record>(record: &T) -> Result<String, CodecError> {
    let mut writer = writer_for(Vec::new());
    writer.write_record(record.to_fields())?;
    let bytes = writer
        .into_inner()
        .map_err(|err| CodecError::Io(err.into_error()))?;
    let mut line = String::from_utf8(bytes)?;
    if line.ends_with('\n') {
        line.pop();
    }
    Ok(line)
}

/// Parse a single line produced by [`encode_line`] or by an older release.
pub fn decode_line<T: Record>(line: &str) -> Result<T, CodecError> {
    decode_numbered_line(line, 1)
}

fn decode_numbered_line<T: Record>(line: &str, number: u64) -> Result<T, CodecError> {
    let mut record = StringRecord::new();
    let parsed = matches!(
        reader_for(line.as_bytes()).read_record(&mut record),
        Ok(true)
    );
    if (!parsed || record.len() != T::FIELDS) && line.contains('"') {
        // Unescaped quote from an older release: the quote is part of the value.
        record = line.split(',').collect();
    }
    decode_record(&record, number)
}

/// Write every record, one per line.
pub fn write_records<T: Record, W: Write>(writer: W, records: &[T]) -> Result<(), CodecError> {
    let mut writer = writer_for(writer);
    for record in records {
        writer.write_record(record.to_fields())?;
    }
    writer.flush()?;
    Ok(())
}

/// Read every record. Blank lines are skipped; `line_offset` shifts reported line numbers.
pub fn read_records<T: Record, R: Read>(reader: R, line_offset: u64) -> Result<Vec<T>, CodecError> {
    let mut records = Vec::new();

    for (index, line) in BufReader::new(reader).lines().enumerate() {
        let line = line?;
        let line = line.trim_end_matches('\r');
        if line.trim().is_empty() {
            continue;
        }
        let number = index as u64 + 1 + line_offset;
        records.push(decode_numbered_line(line, number)?);
    }

    Ok(records)
}

pub fn write_users<W: Write>(writer: W, users: &[User]) -> Result<(), CodecError> {
    write_records(writer, users)
}

pub fn read_users<R: Read>(reader: R) -> Result<Vec<User>, CodecError> {
    read_records(reader, 0)
}

pub fn write_pets<W: Write>(writer: W, pets: &[Pet]) -> Result<(), CodecError> {
    write_records(writer, pets)
}

pub fn read_pets<R: Read>(reader: R) -> Result<Vec<Pet>, CodecError> {
    read_records(reader, 0)
}

/// Applications plus the id the next created application will receive.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ApplicationLedger {
    pub next_id: ApplicationId,
    pub applications: Vec<Application>,
}

impl Default for ApplicationLedger {
    fn default() -> Self {
        Self {
            next_id: ApplicationId(1),
            applications: Vec::new(),
        }
    }
}

impl ApplicationLedger {
    /// Smallest id that is safe to hand out: past both the stored counter and every existing id.
    /// `u32::MAX` is never handed out, so a result of `u32::MAX` means the ids are used up.
    pub fn normalized_next_id(&self) -> ApplicationId {
        let past_existing = self
            .applications
            .iter()
            .map(|application| application.id.0.saturating_add(1))
            .max()
            .unwrap_or(1);
        ApplicationId(self.next_id.0.max(past_existing).max(1))
    }

    /// Take the next id and advance the counter. `None` once the id space is exhausted.
    pub fn allocate_id(&mut self) -> Option<ApplicationId> {
        let id = self.next_id;
        let following = id.0.checked_add(1)?;
        if self.applications.iter().any(|application| application.id >= id) {
            return None;
        }
        self.next_id = ApplicationId(following);
        Some(id)
    }
}

pub fn write_applications<W: Write>(
    mut writer: W,
    ledger: &ApplicationLedger,
) -> Result<(), CodecError> {
    writeln!(writer, "{}{}", NEXT_ID_PREFIX, ledger.next_id.0)?;
    write_records(writer, &ledger.applications)
}

/// Read the applications file. Files without a `NEXT_ID:` header are accepted and the counter
/// is derived from the highest stored id.
pub fn read_applications<R: Read>(mut reader: R) -> Result<ApplicationLedger, CodecError> {
    let mut contents = String::new();
    reader.read_to_string(&mut contents)?;

    let (header, body, line_offset) = match contents.split_once('\n') {
        Some((first, rest)) if first.trim_end().starts_with(NEXT_ID_PREFIX) => {
            (Some(first.trim_end()), rest, 1)
        }
        None if contents.trim_end().starts_with(NEXT_ID_PREFIX) => {
            (Some(contents.trim_end()), "", 1)
        }
        _ => (None, contents.as_str(), 0),
    };

    let next_id = match header {
        Some(header) => {
            let raw = &header[NEXT_ID_PREFIX.len()..];
            let id = raw.trim().parse().map_err(|_| CodecError::InvalidFormat {
                line: 1,
                reason: format!("NEXT_ID must be a positive integer, found '{raw}'"),
            })?;
            ApplicationId(id)
        }
        None => ApplicationId(1),
    };

    let applications = read_records(body.as_bytes(), line_offset)?;
    let ledger = ApplicationLedger {
        next_id,
        applications,
    };

    Ok(ApplicationLedger {
        next_id: ledger.normalized_next_id(),
        ..ledger
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn rex() -> Pet {
        Pet {
            name: "Rex".to_string(),
            breed: "Labrador".to_string(),
            age: 3,
            vaccinated: true,
            adopted: false,
        }
    }

    #[test]
    fn plain_records_match_the_legacy_layout() {
        assert_eq!(encode_line(&rex()).expect("encodes"), "Rex,Labrador,3,1,0");
        assert_eq!(
            encode_line(&User::admin("admin", "admin123")).expect("encodes"),
            "admin,admin123,0"
        );
        let application = Application::pending(ApplicationId(7), "jane", "Rex");
        assert_eq!(
            encode_line(&application).expect("encodes"),
            "7,jane,Rex,Pending"
        );
    }

    #[test]
    fn pet_round_trips_through_a_line() {
        let mut pet = rex();
        pet.adopted = true;
        let line = encode_line(&pet).expect("encodes");
        let decoded: Pet = decode_line(&line).expect("decodes");
        assert_eq!(decoded, pet);
    }

    #[test]
    fn delimiter_in_a_field_is_quoted_and_survives() {
        let user = User::regular("jane doe", "p,ss\"word");
        let line = encode_line(&user).expect("encodes");
        assert_eq!(line, "jane doe,\"p,ss\"\"word\",1");
        let decoded: User = decode_line(&line).expect("decodes");
        assert_eq!(decoded, user);
    }

    #[test]
    fn missing_fields_are_invalid_format() {
        match decode_line::<Pet>("Rex,Labrador,3") {
            Err(CodecError::InvalidFormat { line: 1, reason }) => {
                assert!(reason.contains("expected 5 fields"), "{reason}");
            }
            other => panic!("expected invalid format, got {other:?}"),
        }
    }

    #[test]
    fn bad_tokens_are_invalid_format() {
        for line in [
            "Rex,Labrador,three,1,0",
            "Rex,Labrador,3,yes,0",
            "Rex,Labrador,-3,1,0",
        ] {
            assert!(
                matches!(
                    decode_line::<Pet>(line),
                    Err(CodecError::InvalidFormat { .. })
                ),
                "{line} should fail"
            );
        }
        assert!(matches!(
            decode_line::<User>("jane,pw,7"),
            Err(CodecError::InvalidFormat { .. })
        ));
        assert!(matches!(
            decode_line::<Application>("1,jane,Rex,Withdrawn"),
            Err(CodecError::InvalidFormat { .. })
        ));
    }

    #[test]
    fn applications_file_carries_next_id_header() {
        let ledger = ApplicationLedger {
            next_id: ApplicationId(4),
            applications: vec![
                Application::pending(ApplicationId(2), "jane", "Rex"),
                Application {
                    status: ApplicationStatus::Approved,
                    ..Application::pending(ApplicationId(3), "mark", "Whiskers")
                },
            ],
        };

        let mut buffer = Vec::new();
        write_applications(&mut buffer, &ledger).expect("writes");
        let text = String::from_utf8(buffer.clone()).expect("utf8");
        assert_eq!(
            text,
            "NEXT_ID:4\n2,jane,Rex,Pending\n3,mark,Whiskers,Approved\n"
        );

        let restored = read_applications(buffer.as_slice()).expect("reads");
        assert_eq!(restored, ledger);
    }

    #[test]
    fn legacy_applications_file_derives_next_id() {
        let restored =
            read_applications("5,jane,Rex,Rejected\n\n9,mark,Rex,Pending\n".as_bytes())
                .expect("reads");
        assert_eq!(restored.applications.len(), 2);
        assert_eq!(restored.next_id, ApplicationId(10));
    }

    #[test]
    fn stale_next_id_header_is_bumped_past_existing_ids() {
        let restored =
            read_applications("NEXT_ID:2\n5,jane,Rex,Pending\n".as_bytes()).expect("reads");
        assert_eq!(restored.next_id, ApplicationId(6));
    }

    #[test]
    fn corrupt_line_reports_its_file_line() {
        match read_applications("NEXT_ID:3\n1,jane,Rex,Pending\n2,mark\n".as_bytes()) {
            Err(CodecError::InvalidFormat { line, .. }) => assert_eq!(line, 3),
            other => panic!("expected invalid format, got {other:?}"),
        }
    }

    #[test]
    fn unescaped_quote_from_older_release_stays_in_its_field() {
        let users = read_users("jane,\"abc,1\nmark,pw,1\n".as_bytes()).expect("reads");
        assert_eq!(
            users,
            [User::regular("jane", "\"abc"), User::regular("mark", "pw")]
        );
    }

    #[test]
    fn crlf_line_endings_are_accepted() {
        let pets = read_pets("Rex,Labrador,3,1,0\r\n".as_bytes()).expect("reads");
        assert_eq!(pets, [rex()]);
    }

    #[test]
    fn allocation_stops_before_the_last_id() {
        let mut ledger = ApplicationLedger {
            next_id: ApplicationId(u32::MAX - 1),
            applications: Vec::new(),
        };
        assert_eq!(ledger.allocate_id(), Some(ApplicationId(u32::MAX - 1)));
        assert_eq!(ledger.next_id, ApplicationId(u32::MAX));
        assert_eq!(ledger.allocate_id(), None);
        assert_eq!(ledger.next_id, ApplicationId(u32::MAX));
    }

    #[test]
    fn allocation_refuses_an_id_already_stored() {
        let restored =
            read_applications("NEXT_ID:4294967295\n4294967295,jane,Rex,Pending\n".as_bytes())
                .expect("reads");
        let mut ledger = restored.clone();
        assert_eq!(ledger.allocate_id(), None);
        assert_eq!(ledger, restored);
    }

    #[test]
    fn empty_applications_file_starts_at_one() {
        let restored = read_applications("".as_bytes()).expect("reads");
        assert_eq!(restored, ApplicationLedger::default());
    }
}
