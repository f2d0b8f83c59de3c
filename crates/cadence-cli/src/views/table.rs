use cadence_core::agenda::AgendaItem;
use cadence_core::models::{EndCondition, EntryKind, EntryStatus, Frequency, RecurrencePattern, ScheduleEntry};
use cadence_core::stats::SeriesStatistics;
use chrono::{Datelike, NaiveDate, NaiveDateTime};
use comfy_table::{Attribute, Cell, Color, Row, Table};

/// "every 2 weeks on Mon, Thu, 10 times"
pub fn describe_pattern(pattern: &RecurrencePattern) -> String {
    let unit = match pattern.frequency {
        Frequency::Daily => "day",
        Frequency::Weekly { .. } => "week",
        Frequency::Monthly => "month",
    };
    let mut text = if pattern.interval == 1 {
        format!("every {}", unit)
    } else {
        format!("every {} {}s", pattern.interval, unit)
    };
    if let Frequency::Weekly { days } = &pattern.frequency {
        if days.is_empty() {
            text.push_str(" (no weekdays)");
        } else {
            let names: Vec<_> = days.iter().map(|d| d.to_string()).collect();
            text.push_str(&format!(" on {}", names.join(", ")));
        }
    }
    match pattern.end {
        EndCondition::Never => {}
        EndCondition::AfterOccurrences(count) => text.push_str(&format!(", {} times", count)),
        EndCondition::Until(day) => text.push_str(&format!(", until {}", day)),
    }
    text
}

fn time_label(entry: &ScheduleEntry, starts_at: NaiveDateTime) -> String {
    if entry.is_all_day {
        return "all day".to_string();
    }
    match entry.duration_minutes {
        Some(minutes) if minutes > 0 => {
            let ends_at = starts_at + entry.duration();
            format!("{}-{}", starts_at.format("%H:%M"), ends_at.format("%H:%M"))
        }
        _ => starts_at.format("%H:%M").to_string(),
    }
}

fn title_cell(title: String, done: bool, status: EntryStatus) -> Cell {
    let cell = Cell::new(title);
    if done || status == EntryStatus::Cancelled {
        cell.add_attribute(Attribute::CrossedOut).fg(Color::DarkGrey)
    } else {
        cell
    }
}

pub fn display_agenda(items: &[AgendaItem<'_>], today: NaiveDate) {
    if items.is_empty() {
        println!("Nothing scheduled.");
        return;
    }

    let mut table = Table::new();
    table.set_header(vec!["Day", "Time", "ID", "Title", "Kind"]);

    let mut previous_day = None;
    for item in items {
        let mut row = Row::new();
        let day_text = if previous_day == Some(item.day) {
            String::new()
        } else {
            item.day.format("%a %Y-%m-%d").to_string()
        };
        previous_day = Some(item.day);
        let day_cell = if item.day == today {
            Cell::new(day_text).fg(Color::Cyan).add_attribute(Attribute::Bold)
        } else {
            Cell::new(day_text)
        };
        row.add_cell(day_cell);

        let mut time = time_label(item.entry, item.starts_at);
        if item.is_spillover {
            time = format!("… {}", time);
        }
        row.add_cell(Cell::new(time));
        row.add_cell(Cell::new(item.entry.short_id()));

        let mut title = String::new();
        if item.entry.is_recurring() {
            title.push('↻');
            title.push(' ');
        }
        title.push_str(&item.entry.title);
        row.add_cell(title_cell(title, item.completed, item.entry.status));

        row.add_cell(Cell::new(match item.entry.kind {
            EntryKind::Task => "task",
            EntryKind::TimeBlock => "block",
        }));
        table.add_row(row);
    }

    println!("{table}");
}

pub fn display_entry(entry: &ScheduleEntry, zone_name: &str, rrule: Option<&str>) {
    let mut table = Table::new();
    let mut field = |name: &str, value: String| {
        table.add_row(vec![Cell::new(name).add_attribute(Attribute::Bold), Cell::new(value)]);
    };
    field("ID", entry.id.to_string());
    field("Title", entry.title.clone());
    field("Kind", entry.kind.to_string());
    field("Status", entry.status.to_string());
    if entry.is_all_day {
        field("Starts", format!("{} (all day)", entry.anchor_day()));
    } else {
        field(
            "Starts",
            format!("{} {}", entry.scheduled_at.format("%Y-%m-%d %H:%M"), zone_name),
        );
    }
    if let Some(minutes) = entry.duration_minutes {
        field("Duration", format!("{} min", minutes));
    }
    if let Some(notes) = &entry.notes {
        field("Notes", notes.clone());
    }
    if let Some(parent) = entry.parent_id {
        field("Parent", parent.to_string());
    }
    if let Some(pattern) = &entry.recurrence {
        field("Repeats", describe_pattern(pattern));
        if !pattern.exclude_dates.is_empty() {
            let skipped: Vec<_> = pattern.exclude_dates.iter().map(|d| d.to_string()).collect();
            field("Skipped", skipped.join(", "));
        }
        field(
            "Completed",
            format!("{} occurrence(s)", pattern.completed_instances.len()),
        );
    }
    if let Some(rrule) = rrule {
        field("iCalendar", rrule.to_string());
    }
    println!("{table}");
}

pub fn display_occurrences(entry: &ScheduleEntry, days: &[NaiveDate]) {
    if days.is_empty() {
        println!("No upcoming occurrences.");
        return;
    }
    let mut table = Table::new();
    table.set_header(vec!["#", "Date", "Time", "Done"]);
    let pattern = entry.recurrence.as_ref();
    for (i, day) in days.iter().enumerate() {
        let done = pattern.is_some_and(|p| p.is_complete(*day));
        let mut row = Row::new();
        row.add_cell(Cell::new(i + 1));
        row.add_cell(Cell::new(day.format("%a %Y-%m-%d")));
        row.add_cell(Cell::new(time_label(entry, day.and_time(entry.time_of_day()))));
        row.add_cell(if done {
            Cell::new("✓").fg(Color::Green)
        } else {
            Cell::new("")
        });
        table.add_row(row);
    }
    println!("{table}");
}

pub fn display_stats(title: &str, stats: &SeriesStatistics) {
    let mut table = Table::new();
    table.set_header(vec![Cell::new(title).add_attribute(Attribute::Bold), Cell::new("")]);
    table.add_row(vec!["Occurrences".to_string(), stats.total_occurrences.to_string()]);
    table.add_row(vec!["Completed".to_string(), stats.completed.to_string()]);
    table.add_row(vec![
        "Completion rate".to_string(),
        format!("{:.0}%", stats.completion_rate * 100.0),
    ]);
    table.add_row(vec!["Current streak".to_string(), stats.current_streak.to_string()]);
    table.add_row(vec!["Longest streak".to_string(), stats.longest_streak.to_string()]);
    println!("{table}");
}

/// Days laid out in rows of seven (or a single row for short views), each
/// cell showing the day of month and how many items fall on it.
pub fn display_grid(days: &[NaiveDate], counts: &[usize], today: NaiveDate, focus_month: Option<u32>) {
    let mut table = Table::new();
    let width = days.len().min(7);
    table.set_header(
        days.iter()
            .take(width)
            .map(|day| day.format("%a").to_string())
            .collect::<Vec<_>>(),
    );
    for (week, week_counts) in days.chunks(width.max(1)).zip(counts.chunks(width.max(1))) {
        let mut row = Row::new();
        for (day, count) in week.iter().zip(week_counts) {
            let text = if *count == 0 {
                format!("{:>2}", day.day())
            } else {
                format!("{:>2} ({})", day.day(), count)
            };
            let mut cell = Cell::new(text);
            if focus_month.is_some_and(|month| month != day.month()) {
                cell = cell.fg(Color::DarkGrey);
            }
            if *day == today {
                cell = cell.fg(Color::Cyan).add_attribute(Attribute::Bold);
            }
            row.add_cell(cell);
        }
        table.add_row(row);
    }
    println!("{table}");
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Weekday;

    #[test]
    fn test_describe_pattern() {
        assert_eq!(describe_pattern(&RecurrencePattern::daily(1)), "every day");
        assert_eq!(
            describe_pattern(
                &RecurrencePattern::weekly(2, [Weekday::Thu, Weekday::Mon])
                    .with_end(EndCondition::AfterOccurrences(10))
            ),
            "every 2 weeks on Mon, Thu, 10 times"
        );
        assert_eq!(
            describe_pattern(
                &RecurrencePattern::monthly(3)
                    .with_end(EndCondition::Until(NaiveDate::from_ymd_opt(2025, 12, 31).unwrap()))
            ),
            "every 3 months, until 2025-12-31"
        );
    }
}
