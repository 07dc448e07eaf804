//! Output formatting module

use serde::Serialize;
use triplog_app::RecordedTrip;
use triplog_domain::{Party, Trip, Vehicle};
use triplog_types::{OutputFormat, Result};

/// Trip plus its key, for JSON output
#[derive(Serialize)]
struct TripRow<'a> {
    key: &'a str,
    #[serde(flatten)]
    trip: &'a Trip,
}

fn print_json<T: Serialize + ?Sized>(value: &T) -> Result<()> {
    let content = serde_json::to_string_pretty(value)?;
    println!("{}", content);
    Ok(())
}

pub fn output_recorded(output_format: OutputFormat, recorded: &RecordedTrip) -> Result<()> {
    if output_format == OutputFormat::Json {
        return print_json(recorded);
    }

    println!("\nTrip Recorded");
    println!("=============");
    println!("Key:             {}", recorded.key);
    println!(
        "New vehicle:     {}",
        if recorded.vehicle_created { "Yes" } else { "No" }
    );
    if !recorded.parties_created.is_empty() {
        println!("New parties:     {}", recorded.parties_created.join(", "));
    }
    if recorded.verified_by_read_back {
        println!("(connection dropped during commit; trip confirmed by read-back)");
    }
    Ok(())
}

pub fn output_vehicles(output_format: OutputFormat, vehicles: &[Vehicle]) -> Result<()> {
    if output_format == OutputFormat::Json {
        return print_json(vehicles);
    }

    println!("{:<16} {:>6}  {:<10}", "Vehicle", "Trips", "Last trip");
    println!("{}", "-".repeat(36));
    for v in vehicles {
        println!("{:<16} {:>6}  {}", v.number, v.trip_count, v.last_trip);
    }
    println!("\n{} vehicle(s)", vehicles.len());
    Ok(())
}

pub fn output_parties(output_format: OutputFormat, parties: &[Party]) -> Result<()> {
    if output_format == OutputFormat::Json {
        return print_json(parties);
    }

    println!("{:<32} {:>6}  {:<10}", "Party", "Trips", "Last trip");
    println!("{}", "-".repeat(52));
    for p in parties {
        println!("{:<32} {:>6}  {}", p.name, p.trip_count, p.last_trip);
    }
    println!("\n{} party(ies)", parties.len());
    Ok(())
}

pub fn output_trips(output_format: OutputFormat, trips: &[Trip]) -> Result<()> {
    if output_format == OutputFormat::Json {
        let rows: Vec<_> = trips
            .iter()
            .map(|trip| TripRow {
                key: &trip.key,
                trip,
            })
            .collect();
        return print_json(&rows);
    }

    for trip in trips {
        let route = trip
            .first_route()
            .map(|r| format!("{} -> {}", r.from, r.to))
            .unwrap_or_default();
        let extra = if trip.routes.len() > 1 {
            format!(" (+{} more)", trip.routes.len() - 1)
        } else {
            String::new()
        };
        println!(
            "{}  {:<12} {:<16} {}{}",
            trip.date, trip.vehicle_no, trip.driver, route, extra
        );
    }
    println!("\n{} trip(s)", trips.len());
    Ok(())
}

pub fn output_trip(output_format: OutputFormat, trip: &Trip) -> Result<()> {
    if output_format == OutputFormat::Json {
        return print_json(&TripRow {
            key: &trip.key,
            trip,
        });
    }

    println!("\nTrip {}", trip.key);
    println!("==========");
    println!("Date:            {}", trip.date);
    println!("Driver:          {}", trip.driver);
    println!("Vehicle:         {}", trip.vehicle_no);
    println!("Recorded at:     {}", trip.created_at.format("%Y-%m-%d %H:%M:%S UTC"));
    println!("\nRoutes:");
    for (i, route) in trip.routes.iter().enumerate() {
        println!("  {}. {} -> {}", i + 1, route.from, route.to);
    }
    Ok(())
}

pub fn output_suggestions(output_format: OutputFormat, names: &[String]) -> Result<()> {
    if output_format == OutputFormat::Json {
        return print_json(names);
    }

    if names.is_empty() {
        println!("No matching parties");
    }
    for name in names {
        println!("{}", name);
    }
    Ok(())
}
