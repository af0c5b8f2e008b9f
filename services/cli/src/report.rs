use std::io::{self, Write};

use chrono::{Local, NaiveDate};
use clap::{Args, ValueEnum};
use pet_adoption::adoption::{
    AdoptionRepository, ApplicationId, ApplicationStatus, RecordStore, Role,
};
use pet_adoption::error::AppError;
use serde::Serialize;

#[derive(ValueEnum, Clone, Copy, Debug, Default, PartialEq, Eq)]
pub(crate) enum ReportFormat {
    #[default]
    Text,
    Json,
}

#[derive(Args, Debug)]
pub(crate) struct ReportArgs {
    /// Output format
    #[arg(long, value_enum, default_value_t = ReportFormat::Text)]
    pub(crate) format: ReportFormat,
    /// Override the reporting date (defaults to today).
    #[arg(long, value_parser = parse_date)]
    pub(crate) today: Option<NaiveDate>,
}

pub(crate) fn parse_date(raw: &str) -> Result<NaiveDate, String> {
    NaiveDate::parse_from_str(raw.trim(), "%Y-%m-%d")
        .map_err(|err| format!("failed to parse '{raw}' as YYYY-MM-DD ({err})"))
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub(crate) struct PetCounts {
    pub(crate) total: usize,
    pub(crate) available: usize,
    pub(crate) adopted: usize,
    pub(crate) vaccinated: usize,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub(crate) struct UserCounts {
    pub(crate) admins: usize,
    pub(crate) regular: usize,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub(crate) struct ApplicationCounts {
    pub(crate) pending: usize,
    pub(crate) approved: usize,
    pub(crate) rejected: usize,
    pub(crate) next_id: ApplicationId,
}

/// Point-in-time inventory of the registry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub(crate) struct InventoryReport {
    pub(crate) generated_on: NaiveDate,
    pub(crate) pets: PetCounts,
    pub(crate) users: UserCounts,
    pub(crate) applications: ApplicationCounts,
}

impl InventoryReport {
    pub(crate) fn build<S: RecordStore>(
        repository: &AdoptionRepository<S>,
        generated_on: NaiveDate,
    ) -> Self {
        let pets = repository.pets();
        let adopted = pets.iter().filter(|pet| pet.adopted).count();
        let admins = repository
            .users()
            .iter()
            .filter(|user| user.role() == Role::Admin)
            .count();
        let with_status = |status: ApplicationStatus| {
            repository
                .applications()
                .iter()
                .filter(|application| application.status == status)
                .count()
        };

        Self {
            generated_on,
            pets: PetCounts {
                total: pets.len(),
                available: pets.len() - adopted,
                adopted,
                vaccinated: pets.iter().filter(|pet| pet.vaccinated).count(),
            },
            users: UserCounts {
                admins,
                regular: repository.users().len() - admins,
            },
            applications: ApplicationCounts {
                pending: with_status(ApplicationStatus::Pending),
                approved: with_status(ApplicationStatus::Approved),
                rejected: with_status(ApplicationStatus::Rejected),
                next_id: repository.next_application_id(),
            },
        }
    }

    pub(crate) fn render_text<W: Write>(&self, mut out: W) -> io::Result<()> {
        writeln!(out, "Pet adoption inventory ({})", self.generated_on)?;
        writeln!(
            out,
            "- Pets: {} total | {} available | {} adopted | {} vaccinated",
            self.pets.total, self.pets.available, self.pets.adopted, self.pets.vaccinated
        )?;
        writeln!(
            out,
            "- Users: {} admins | {} regular",
            self.users.admins, self.users.regular
        )?;
        writeln!(
            out,
            "- Applications: {} pending | {} approved | {} rejected (next id {})",
            self.applications.pending,
            self.applications.approved,
            self.applications.rejected,
            self.applications.next_id
        )
    }

    pub(crate) fn render_json<W: Write>(&self, mut out: W) -> io::Result<()> {
        serde_json::to_writer_pretty(&mut out, self)?;
        writeln!(out)
    }
}

pub(crate) fn run_report<S: RecordStore>(
    repository: &AdoptionRepository<S>,
    args: ReportArgs,
) -> Result<(), AppError> {
    let today = args.today.unwrap_or_else(|| Local::now().date_naive());
    let report = InventoryReport::build(repository, today);

    let stdout = io::stdout();
    let out = stdout.lock();
    match args.format {
        ReportFormat::Text => report.render_text(out)?,
        ReportFormat::Json => report.render_json(out)?,
    }
    Ok(())
}
