//! Status command for showing the latest sleep and today's alarms.

use std::io::Write;
use std::path::Path;

use anyhow::Result;
use snooze_core::{AlarmDate, Clock};
use snooze_db::Database;

pub fn run<W: Write>(
    writer: &mut W,
    db: &Database,
    clock: &dyn Clock,
    database_path: &Path,
    timezone: &str,
) -> Result<()> {
    writeln!(writer, "Snooze status")?;
    writeln!(writer, "Database: {}", database_path.display())?;
    writeln!(writer, "Timezone: {timezone}")?;
    writeln!(writer, "Sleeps recorded: {}", db.sleep_count()?)?;

    match db.latest_sleep()? {
        Some(sleep) => {
            let local = clock.local_from_epoch(sleep.slept_at);
            let when = local.map_or_else(
                || sleep.slept_at.to_string(),
                |local| local.format("%Y-%m-%d %H:%M:%S").to_string(),
            );
            writeln!(writer, "Latest sleep: {when} ({})", sleep.sleep_type)?;
        }
        None => writeln!(writer, "Latest sleep: none")?,
    }

    let today = AlarmDate::from_naive(clock.to_local(clock.now()).date());
    let alarms: Vec<String> = db
        .list_alarms(today)?
        .into_iter()
        .filter_map(|alarm| clock.alarm_time_of(today, alarm.alarm_time))
        .map(|time| time.to_string())
        .collect();
    if alarms.is_empty() {
        writeln!(writer, "Alarms for {today}: none")?;
    } else {
        writeln!(writer, "Alarms for {today}: {}", alarms.join(", "))?;
    }

    Ok(())
}
