// ABOUTME: Human-readable rendering of WHOOP payloads for MCP tool results
// ABOUTME: Null-safe field access; upstream records frequently omit score fields
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Async-IO.org

//! # Response Formatters
//!
//! WHOOP returns paginated JSON records whose `score` objects are missing
//! while a measurement is still being processed. These formatters render the
//! payloads into readable summaries for LLM consumption, defaulting absent
//! numeric fields to zero the way the upstream dashboard does.

use chrono::DateTime;
use serde_json::Value;

/// Community-identified sport ids; the WHOOP API itself only exposes numbers
const COMMON_SPORTS: &[(u64, &str)] = &[
    (0, "Other"),
    (1, "Running"),
    (2, "Cycling"),
    (3, "Weightlifting"),
    (4, "Swimming"),
    (9, "Walking"),
    (12, "Tennis"),
    (27, "Basketball"),
    (33, "Football"),
    (41, "Soccer"),
    (45, "HIIT"),
    (47, "Yoga"),
    (55, "Pilates"),
    (71, "Golf"),
    (103, "Meditation"),
    (104, "CrossFit"),
    (124, "Strength Training"),
];

/// Best-known name for a sport id
#[must_use]
pub fn sport_name(sport_id: u64) -> String {
    COMMON_SPORTS
        .iter()
        .find(|(id, _)| *id == sport_id)
        .map_or_else(|| format!("Sport {sport_id}"), |(_, name)| (*name).to_owned())
}

/// Render the sport ids appearing in recent workout history
#[must_use]
pub fn format_sports_mapping(data: &Value) -> String {
    let mut ids: Vec<u64> = data
        .get("records")
        .and_then(Value::as_array)
        .map(Vec::as_slice)
        .unwrap_or_default()
        .iter()
        .filter_map(|workout| workout.get("sport_id").and_then(Value::as_u64))
        .collect();
    ids.sort_unstable();
    ids.dedup();

    if ids.is_empty() {
        return "No sports found in your recent workout history. Try working out with different \
                sports to build the mapping."
            .to_owned();
    }

    let mut result = "WHOOP sports from your workout history:\n\n".to_owned();
    for id in ids {
        result.push_str(&format!("ID {id}: {}\n", sport_name(id)));
    }
    result.push_str(
        "\nNote: The WHOOP API does not provide sport names; these are community-identified.",
    );
    result
}

/// Render the sports matching a search term
#[must_use]
pub fn search_sports(query: &str) -> String {
    let query_lower = query.to_lowercase();
    let matches: Vec<&(u64, &str)> = COMMON_SPORTS
        .iter()
        .filter(|(_, name)| name.to_lowercase().contains(&query_lower))
        .collect();

    if matches.is_empty() {
        return format!(
            "No matching sports found for '{query}'. Note that WHOOP sport names are based on \
             community knowledge, not official API data."
        );
    }

    let mut result = format!("WHOOP sports matching '{query}':\n\n");
    for (id, name) in matches {
        result.push_str(&format!("ID {id}: {name}\n"));
    }
    result.push_str("\nNote: These are community-identified sport IDs and may not be 100% accurate.");
    result
}

/// Numeric field with zero default
fn num(value: &Value, key: &str) -> f64 {
    value.get(key).and_then(Value::as_f64).unwrap_or(0.0)
}

/// String field with "Unknown" default
fn text<'a>(value: &'a Value, key: &str) -> &'a str {
    value.get(key).and_then(Value::as_str).unwrap_or("Unknown")
}

/// Format an RFC 3339 timestamp as a human-readable date
fn format_date(timestamp: &str) -> String {
    DateTime::parse_from_rfc3339(timestamp).map_or_else(
        |_| timestamp.to_owned(),
        |dt| dt.format("%A, %b %d, %Y").to_string(),
    )
}

/// First record of a paginated response, if any
fn first_record(data: &Value) -> Option<&Value> {
    data.get("records").and_then(Value::as_array)?.first()
}

fn strain_level(strain: f64) -> &'static str {
    if strain >= 18.0 {
        "All Out (18.0-21.0)"
    } else if strain >= 14.0 {
        "Strenuous (14.0-17.9)"
    } else if strain >= 10.0 {
        "Moderate (10.0-13.9)"
    } else if strain >= 4.0 {
        "Light (4.0-9.9)"
    } else {
        "Minimal (0-3.9)"
    }
}

/// Render a sleep response
#[must_use]
pub fn format_sleep(data: &Value) -> String {
    let Some(sleep) = first_record(data) else {
        return "No sleep data found for the specified date range.".to_owned();
    };

    let empty = Value::Null;
    let score = sleep.get("score").unwrap_or(&empty);
    let stages = score.get("stage_summary").unwrap_or(&empty);

    let start = text(sleep, "start");
    let end = text(sleep, "end");
    let sleep_date = format_date(start);

    let light = num(stages, "total_light_sleep_time_milli");
    let deep = num(stages, "total_slow_wave_sleep_time_milli");
    let rem = num(stages, "total_rem_sleep_time_milli");
    let in_bed = num(stages, "total_in_bed_time_milli");
    let awake = num(stages, "total_awake_time_milli");

    let total_sleep_hours = (light + deep + rem) / 3_600_000.0;
    let in_bed_hours = in_bed / 3_600_000.0;

    let description = if sleep.get("nap").and_then(Value::as_bool).unwrap_or(false) {
        "Nap"
    } else {
        "Night Sleep"
    };

    format!(
        "Sleep: {description} on {sleep_date}\n\
         Sleep Performance: {performance:.0}%\n\
         Sleep Efficiency: {efficiency:.1}%\n\
         Sleep Duration: {total_sleep_hours:.2} hours ({sh}h {sm}m)\n\
         Time in Bed: {in_bed_hours:.2} hours ({bh}h {bm}m)\n\
         Started: {start}\n\
         Ended: {end}\n\
         Light Sleep: {light_min:.1} minutes\n\
         Deep Sleep: {deep_min:.1} minutes\n\
         REM Sleep: {rem_min:.1} minutes\n\
         Awake: {awake_min:.1} minutes\n\
         Sleep Cycles: {cycles:.0}\n\
         Disturbances: {disturbances:.0}",
        performance = num(score, "sleep_performance_percentage"),
        efficiency = num(score, "sleep_efficiency_percentage"),
        sh = total_sleep_hours as u64,
        sm = ((total_sleep_hours % 1.0) * 60.0) as u64,
        bh = in_bed_hours as u64,
        bm = ((in_bed_hours % 1.0) * 60.0) as u64,
        light_min = light / 60_000.0,
        deep_min = deep / 60_000.0,
        rem_min = rem / 60_000.0,
        awake_min = awake / 60_000.0,
        cycles = num(stages, "sleep_cycle_count"),
        disturbances = num(stages, "disturbance_count"),
    )
}

/// Render a recovery response
#[must_use]
pub fn format_recovery(data: &Value) -> String {
    let Some(recovery) = first_record(data) else {
        return "No recovery data found for the specified date range.".to_owned();
    };

    let empty = Value::Null;
    let score = recovery.get("score").unwrap_or(&empty);

    let recovery_score = num(score, "recovery_score");
    let category = if recovery_score >= 67.0 {
        "Green (High)"
    } else if recovery_score >= 34.0 {
        "Yellow (Medium)"
    } else {
        "Red (Low)"
    };

    let temp_display = score
        .get("skin_temp_celsius")
        .and_then(Value::as_f64)
        .map_or_else(
            || "N/A".to_owned(),
            |celsius| {
                let fahrenheit = celsius * 9.0 / 5.0 + 32.0;
                format!("{celsius:.1}\u{b0}C ({fahrenheit:.1}\u{b0}F)")
            },
        );

    let spo2 = score
        .get("spo2_percentage")
        .and_then(Value::as_f64)
        .map_or_else(|| "N/A".to_owned(), |v| format!("{v}"));

    format!(
        "Recovery Status: {category}\n\
         Recovery Score: {recovery_score:.0}%\n\
         Date: {date}\n\
         Resting Heart Rate: {rhr:.0} bpm\n\
         Heart Rate Variability: {hrv:.1} ms\n\
         SPO2: {spo2}%\n\
         Skin Temperature: {temp_display}",
        date = format_date(text(recovery, "created_at")),
        rhr = num(score, "resting_heart_rate"),
        hrv = num(score, "hrv_rmssd_milli"),
    )
}

/// Render a workout response (paginated list or single record)
#[must_use]
pub fn format_workout(data: &Value) -> String {
    let workout = if data.get("records").is_some() {
        match first_record(data) {
            Some(record) => record,
            None => return "No workout data found for the specified criteria.".to_owned(),
        }
    } else {
        data
    };

    let empty = Value::Null;
    let score = workout.get("score").unwrap_or(&empty);
    let zones = score.get("zone_duration").unwrap_or(&empty);

    let start = text(workout, "start");
    let end = text(workout, "end");
    let workout_date = format_date(start);

    let sport = sport_name(workout.get("sport_id").and_then(Value::as_u64).unwrap_or(0));

    let duration_minutes = match (
        DateTime::parse_from_rfc3339(start),
        DateTime::parse_from_rfc3339(end),
    ) {
        (Ok(start_dt), Ok(end_dt)) => (end_dt - start_dt).num_seconds() as f64 / 60.0,
        _ => 0.0,
    };

    let strain = num(score, "strain");
    let kilojoules = num(score, "kilojoule");
    let calories = kilojoules / 4.184;

    let distance_info = score
        .get("distance_meter")
        .and_then(Value::as_f64)
        .map_or_else(String::new, |meters| {
            format!("Distance: {meters:.2}m ({:.2} miles)\n", meters / 1609.34)
        });

    format!(
        "Workout: {sport} on {workout_date}\n\
         Strain Level: {level}\n\
         Strain Score: {strain:.1}/21.0\n\
         Average Heart Rate: {avg_hr:.0} bpm\n\
         Max Heart Rate: {max_hr:.0} bpm\n\
         Duration: {duration_minutes:.1} minutes ({dh}h {dm}m)\n\
         Calories Burned: {calories:.0} kcal ({kilojoules:.0} kJ)\n\
         {distance_info}Started: {start}\n\
         Ended: {end}\n\
         Zone 1 (50-60%): {z1:.1} minutes\n\
         Zone 2 (60-70%): {z2:.1} minutes\n\
         Zone 3 (70-80%): {z3:.1} minutes\n\
         Zone 4 (80-90%): {z4:.1} minutes\n\
         Zone 5 (90-100%): {z5:.1} minutes",
        level = strain_level(strain),
        avg_hr = num(score, "average_heart_rate"),
        max_hr = num(score, "max_heart_rate"),
        dh = (duration_minutes / 60.0) as u64,
        dm = (duration_minutes % 60.0) as u64,
        z1 = num(zones, "zone_one_milli") / 60_000.0,
        z2 = num(zones, "zone_two_milli") / 60_000.0,
        z3 = num(zones, "zone_three_milli") / 60_000.0,
        z4 = num(zones, "zone_four_milli") / 60_000.0,
        z5 = num(zones, "zone_five_milli") / 60_000.0,
    )
}

/// Render a cycle (daily strain) response
#[must_use]
pub fn format_cycle(data: &Value) -> String {
    let Some(cycle) = first_record(data) else {
        return "No cycle data found for the specified date range.".to_owned();
    };

    let empty = Value::Null;
    let score = cycle.get("score").unwrap_or(&empty);

    let strain = num(score, "strain");
    let kilojoules = num(score, "kilojoule");

    format!(
        "Day: {date}\n\
         Daily Strain Level: {level}\n\
         Daily Strain: {strain:.1}/21.0\n\
         Energy Expenditure: {kilojoules:.1} kJ ({calories:.0} kcal)\n\
         Average Heart Rate: {avg_hr:.0} bpm\n\
         Max Heart Rate: {max_hr:.0} bpm\n\
         Status: {status}",
        date = format_date(text(cycle, "start")),
        level = strain_level(strain),
        calories = kilojoules / 4.184,
        avg_hr = num(score, "average_heart_rate"),
        max_hr = num(score, "max_heart_rate"),
        status = text(cycle, "score_state"),
    )
}

/// Render a profile response
#[must_use]
pub fn format_profile(data: &Value) -> String {
    // The profile endpoint nests fields under "user" in older responses and
    // returns them flat in newer ones
    let profile = data.get("user").unwrap_or(data);

    let member_since = profile
        .get("createdAt")
        .and_then(Value::as_str)
        .map_or_else(
            || "Unknown".to_owned(),
            |ts| {
                DateTime::parse_from_rfc3339(ts)
                    .map_or_else(|_| ts.to_owned(), |dt| dt.format("%B %d, %Y").to_string())
            },
        );

    format!(
        "Name: {first} {last}\nEmail: {email}\nMember Since: {member_since}",
        first = profile
            .get("first_name")
            .or_else(|| profile.get("firstName"))
            .and_then(Value::as_str)
            .unwrap_or("Unknown"),
        last = profile
            .get("last_name")
            .or_else(|| profile.get("lastName"))
            .and_then(Value::as_str)
            .unwrap_or("Unknown"),
        email = text(profile, "email"),
    )
}

/// Render a body-measurement response
#[must_use]
pub fn format_body_measurement(data: &Value) -> String {
    let height_m = num(data, "height_meter");
    let height_inches = height_m * 39.37;
    let weight_kg = num(data, "weight_kilogram");

    format!(
        "Height: {height_cm:.1} cm ({feet}'{inches}\")\n\
         Weight: {weight_kg:.1} kg ({weight_lbs:.1} lbs)\n\
         Max Heart Rate: {max_hr:.0} bpm",
        height_cm = height_m * 100.0,
        feet = (height_inches / 12.0) as u64,
        inches = (height_inches % 12.0).round() as u64,
        weight_lbs = weight_kg * 2.20462,
        max_hr = num(data, "max_heart_rate"),
    )
}
