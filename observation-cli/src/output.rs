use observation_core::Observation;

const TIME_FORMAT: &str = "%Y-%m-%d %H:%M";

pub fn print_table(observations: &[Observation]) {
    if observations.is_empty() {
        println!("No observations recorded yet. Run `observations new` to add one.");
        return;
    }

    println!(
        "{:>6}  {:>9}  {:>10}  {:<16}  {:>8}  {:<16}",
        "ID", "LATITUDE", "LONGITUDE", "SKY", "TEMP", "RECORDED"
    );
    for obs in observations {
        println!("{}", table_row(obs));
    }
}

fn table_row(obs: &Observation) -> String {
    let id = obs.observation_id.map(|id| id.to_string()).unwrap_or_else(|| "-".to_string());
    let recorded = obs
        .created_at
        .map(|ts| ts.format(TIME_FORMAT).to_string())
        .unwrap_or_else(|| "-".to_string());
    let temp = format!("{}°{}", obs.air_temperature, obs.air_temperature_unit.as_str());

    format!(
        "{:>6}  {:>9}  {:>10}  {:<16}  {:>8}  {:<16}",
        id,
        obs.latitude,
        obs.longitude,
        obs.sky_condition.label(),
        temp,
        recorded
    )
}

pub fn print_observation(obs: &Observation) {
    if let Some(id) = obs.observation_id {
        println!("Observation {id}");
    }
    println!("  Latitude:        {}", obs.latitude);
    println!("  Longitude:       {}", obs.longitude);
    println!("  Sky conditions:  {} ({})", obs.sky_condition.label(), obs.sky_condition.code());
    println!(
        "  Air temperature: {} {}",
        obs.air_temperature,
        obs.air_temperature_unit.label()
    );
    if let Some(created) = obs.created_at {
        println!("  Recorded:        {}", created.format(TIME_FORMAT));
    }
    if let Some(updated) = obs.updated_at {
        println!("  Updated:         {}", updated.format(TIME_FORMAT));
    }
}
