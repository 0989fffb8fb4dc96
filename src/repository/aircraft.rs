// ABOUTME: Aircraft repository: list, lookup, add, update, delete, search and summary
// ABOUTME: Every operation validates first, then runs on its own connection

use crate::config::DatabaseSettings;
use crate::error::DataError;
use crate::filters::{build_filter, AircraftColumn};
use crate::postgres::{Record, Session};
use crate::validation::AircraftInput;

#[derive(Debug, Clone)]
pub struct AircraftRepository {
    settings: DatabaseSettings,
}

impl AircraftRepository {
    pub fn new(settings: DatabaseSettings) -> Self {
        Self { settings }
    }

    /// All aircraft ordered by ID
    pub async fn list(&self) -> Result<Vec<Record>, DataError> {
        let session = Session::open(&self.settings).await?;
        session
            .fetch_all("SELECT * FROM aircraft ORDER BY aircraftid ASC", &[])
            .await
    }

    /// `None` if no aircraft has this ID
    pub async fn get_by_id(&self, aircraft_id: i64) -> Result<Option<Record>, DataError> {
        let session = Session::open(&self.settings).await?;
        session
            .fetch_one(
                "SELECT * FROM aircraft WHERE aircraftid = $1",
                &[&aircraft_id],
            )
            .await
    }

    /// Insert a new aircraft
    ///
    /// Field rules are checked before any connection is opened. The ID is
    /// then looked up on the same connection used for the insert.
    ///
    /// # Errors
    ///
    /// - [`DataError::Validation`] with every violated rule
    /// - [`DataError::DuplicateKey`] if the ID is taken; nothing is written
    /// - [`DataError::Query`] if the insert fails (rolled back)
    pub async fn add(&self, input: &AircraftInput) -> Result<(), DataError> {
        let aircraft = input.validate()?;

        let mut session = Session::open(&self.settings).await?;

        let existing = session
            .fetch_one(
                "SELECT aircraftid FROM aircraft WHERE aircraftid = $1",
                &[&aircraft.aircraft_id],
            )
            .await?;
        if existing.is_some() {
            tracing::info!(
                "Refusing to add aircraft {}: ID already exists",
                aircraft.aircraft_id
            );
            return Err(DataError::DuplicateKey {
                entity: "Aircraft",
                id: aircraft.aircraft_id.to_string(),
            });
        }

        session
            .execute(
                "INSERT INTO aircraft \
                 (aircraftid, icaocode, aircraftregistration, name, manufacturer, model) \
                 VALUES ($1, $2, $3, $4, $5, $6)",
                &[
                    &aircraft.aircraft_id,
                    &aircraft.icao_code,
                    &aircraft.registration,
                    &aircraft.name,
                    &aircraft.manufacturer,
                    &aircraft.model,
                ],
            )
            .await?;

        tracing::info!("Added aircraft {}", aircraft.aircraft_id);
        Ok(())
    }

    /// Replace every field except the ID
    ///
    /// # Returns
    ///
    /// Number of rows changed; 0 if the ID does not exist
    pub async fn update(&self, input: &AircraftInput) -> Result<u64, DataError> {
        let aircraft = input.validate()?;

        let mut session = Session::open(&self.settings).await?;
        let updated = session
            .execute(
                "UPDATE aircraft \
                 SET icaocode = $1, aircraftregistration = $2, name = $3, \
                     manufacturer = $4, model = $5 \
                 WHERE aircraftid = $6",
                &[
                    &aircraft.icao_code,
                    &aircraft.registration,
                    &aircraft.name,
                    &aircraft.manufacturer,
                    &aircraft.model,
                    &aircraft.aircraft_id,
                ],
            )
            .await?;

        if updated == 0 {
            tracing::info!("No aircraft with ID {} to update", aircraft.aircraft_id);
        }
        Ok(updated)
    }

    /// Delete by ID; deleting a missing ID affects 0 rows and is not an error
    pub async fn delete(&self, aircraft_id: i64) -> Result<u64, DataError> {
        let mut session = Session::open(&self.settings).await?;
        session
            .execute(
                "DELETE FROM aircraft WHERE aircraftid = $1",
                &[&aircraft_id],
            )
            .await
    }

    /// Aircraft count per manufacturer, as `manufacturer` / `total_aircraft`
    pub async fn summary_by_manufacturer(&self) -> Result<Vec<Record>, DataError> {
        let session = Session::open(&self.settings).await?;
        session
            .fetch_all(
                "SELECT manufacturer, COUNT(*) AS total_aircraft \
                 FROM aircraft \
                 GROUP BY manufacturer \
                 ORDER BY manufacturer",
                &[],
            )
            .await
    }

    /// Aircraft matching `attribute operator value`
    ///
    /// The attribute and operator are checked against allow-lists before a
    /// connection is opened; see [`build_filter`].
    pub async fn search(
        &self,
        attribute: &str,
        operator: &str,
        value: &str,
    ) -> Result<Vec<Record>, DataError> {
        let filter = build_filter::<AircraftColumn>(attribute, operator, value)?;

        let session = Session::open(&self.settings).await?;
        let sql = format!(
            "SELECT * FROM aircraft WHERE {} ORDER BY aircraftid ASC",
            filter.clause()
        );
        session.fetch_all(&sql, &[filter.param().as_sql()]).await
    }
}
