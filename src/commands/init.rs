use crate::io;
use anyhow::Result;
use std::path::PathBuf;

pub fn init_config(force: bool) -> Result<()> {
    let config_path = PathBuf::from(".trainmap.toml");

    if config_path.exists() && !force {
        anyhow::bail!("Configuration file already exists. Use --force to overwrite.");
    }

    let default_config = r#"# Trainmap Configuration

[pi]
# Accepted PI labels; a record carrying several is attributed to the
# first match in the record's own label order.
labels = ["PI-4_Grading", "PI-4_Reporting"]
# Uncomment to enable the on-track health sub-score.
# end_date = "2024-03-29"

[fields]
story_points = "customfield_10003"
workstream = "customfield_20403"
business_benefit = "customfield_11800"
sprint = "customfield_11701"
feature_link = "customfield_11702"

[statuses]
done = ["Done", "Closed"]
in_progress = ["In Progress"]

[health]
predictability = 0.5
completion = 0.3
on_track = 0.2

[health.bands]
healthy_min = 80.0
at_risk_min = 50.0

[velocity]
rolling_window = 3
max_ordinal_distance = 100

[cycle_time]
percentile = 85
"#;

    io::write_file(&config_path, default_config)?;
    println!("Created .trainmap.toml configuration file");

    Ok(())
}
