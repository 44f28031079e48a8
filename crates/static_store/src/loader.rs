use std::fmt;
use std::path::{Path, PathBuf};

use gtfs::data_model::agency::Agency;
use gtfs::data_model::routes::Route;
use gtfs::data_model::stop_times::StopTime;
use gtfs::data_model::stops::Stop;
use gtfs::data_model::transfers::TransfersRow;
use gtfs::data_model::trips::Trip;
use gtfs::database::{read_csv_file, GtfsDatabase, InMemoryPrimaryKeyTable};

/// Everything that can go wrong loading a static feed directory into a
/// [`GtfsDatabase`]. Transfers.txt is optional per the GTFS reference, so
/// its absence is not an error; every other file is required.
#[derive(Debug)]
pub enum LoadError {
    MissingRequiredFile { path: PathBuf },
    Csv { path: PathBuf, source: Box<dyn std::error::Error> },
}

impl fmt::Display for LoadError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::MissingRequiredFile { path } => {
                write!(f, "required GTFS file missing: {}", path.display())
            }
            Self::Csv { path, source } => {
                write!(f, "failed to parse {}: {}", path.display(), source)
            }
        }
    }
}

impl std::error::Error for LoadError {}

fn required_csv<T, K, V>(table: &mut T, dir: &Path, file_name: &str) -> Result<(), LoadError>
where
    T: gtfs::database::PrimaryKeyTable<K, V>,
    V: gtfs::database::WithPrimaryKey<K>,
    V: serde::de::DeserializeOwned,
{
    let path = dir.join(file_name);
    if !path.is_file() {
        return Err(LoadError::MissingRequiredFile { path });
    }
    read_csv_file(table, &path).map_err(|source| LoadError::Csv { path, source })
}

fn optional_csv<T, K, V>(table: &mut T, dir: &Path, file_name: &str) -> Result<(), LoadError>
where
    T: gtfs::database::PrimaryKeyTable<K, V>,
    V: gtfs::database::WithPrimaryKey<K>,
    V: serde::de::DeserializeOwned,
{
    let path = dir.join(file_name);
    if !path.is_file() {
        return Ok(());
    }
    read_csv_file(table, &path).map_err(|source| LoadError::Csv { path, source })
}

/// Reads a directory laid out like an unzipped GTFS static feed
/// (stops.txt, routes.txt, trips.txt, stop_times.txt, agency.txt and the
/// optional transfers.txt) into an in-memory [`GtfsDatabase`].
pub fn load_static_feed(dir: &Path) -> Result<GtfsDatabase, LoadError> {
    let mut agency: InMemoryPrimaryKeyTable<_, Agency> = InMemoryPrimaryKeyTable::new();
    let mut stops: InMemoryPrimaryKeyTable<_, Stop> = InMemoryPrimaryKeyTable::new();
    let mut routes: InMemoryPrimaryKeyTable<_, Route> = InMemoryPrimaryKeyTable::new();
    let mut trips: InMemoryPrimaryKeyTable<_, Trip> = InMemoryPrimaryKeyTable::new();
    let mut stop_times: InMemoryPrimaryKeyTable<_, StopTime> = InMemoryPrimaryKeyTable::new();
    let mut transfers: InMemoryPrimaryKeyTable<_, TransfersRow> = InMemoryPrimaryKeyTable::new();

    required_csv(&mut agency, dir, "agency.txt")?;
    required_csv(&mut stops, dir, "stops.txt")?;
    required_csv(&mut routes, dir, "routes.txt")?;
    required_csv(&mut trips, dir, "trips.txt")?;
    required_csv(&mut stop_times, dir, "stop_times.txt")?;
    optional_csv(&mut transfers, dir, "transfers.txt")?;

    log::info!(
        "loaded static feed from {}: {} stops, {} routes, {} trips, {} stop_times, {} transfers",
        dir.display(),
        stops.get_all().len(),
        routes.get_all().len(),
        trips.get_all().len(),
        stop_times.get_all().len(),
        transfers.get_all().len(),
    );

    Ok(GtfsDatabase {
        agency: Box::new(agency),
        stops: Box::new(stops),
        routes: Box::new(routes),
        trips: Box::new(trips),
        stop_times: Box::new(stop_times),
        transfers: Box::new(transfers),
    })
}
