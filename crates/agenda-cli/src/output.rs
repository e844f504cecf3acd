//! Plain-text tables for terminal output.

use agenda_engine::{AgendaView, Occurrence, ReminderKind, ReminderPlan, ScheduleStatus};
use chrono::{DateTime, Utc};
use chrono_tz::Tz;

fn truncate(s: &str, max: usize) -> String {
    if s.chars().count() <= max {
        s.to_string()
    } else {
        let head: String = s.chars().take(max.saturating_sub(1)).collect();
        format!("{head}…")
    }
}

fn time_of(occurrence: &Occurrence, tz: Tz) -> String {
    if occurrence.all_day {
        "all day".to_string()
    } else {
        occurrence.start.with_timezone(&tz).format("%H:%M").to_string()
    }
}

pub fn print_instants(instants: &[DateTime<Utc>], tz: Tz) {
    for (n, instant) in instants.iter().enumerate() {
        println!("{:>3}  {}", n, instant.with_timezone(&tz).to_rfc3339());
    }
}

pub fn print_status(status: &ScheduleStatus) {
    match status {
        ScheduleStatus::Local => println!("Order: local priority"),
        ScheduleStatus::External {
            matched,
            ignored,
            appended,
        } => println!(
            "Order: suggested ({matched} matched, {ignored} ignored, {appended} appended)"
        ),
        ScheduleStatus::AiFallback { reason } => {
            println!("Order: local priority (suggestion unusable: {reason:?})")
        }
        ScheduleStatus::Stale => println!("Order: local priority (suggestion stale)"),
    }
}

pub fn print_agenda(view: &AgendaView, tz: Tz) {
    println!("{:<12} {:<8} {:<4} {:<10} {:<36}", "DATE", "TIME", "PRI", "CATEGORY", "TITLE");
    println!("{}", "-".repeat(74));
    for (date, occurrences) in &view.schedule.by_day {
        if let Some(label) = view.buckets.get(*date).and_then(|b| b.holiday.as_deref()) {
            println!("{:<12} {:<8} {:<4} {:<10} {:<36}", date.format("%Y-%m-%d"), "", "", "holiday", truncate(label, 34));
        }
        for o in occurrences {
            println!(
                "{:<12} {:<8} {:<4} {:<10} {:<36}",
                date.format("%Y-%m-%d"),
                time_of(o, tz),
                o.priority,
                o.category.key(),
                truncate(&o.title, 34),
            );
        }
    }
    println!();
    println!("{} occurrences on {} days", view.schedule.len(), view.schedule.by_day.len());
    print_status(&view.schedule.status);
}

pub fn print_reminders(reminders: &[ReminderPlan], tz: Tz) {
    println!("{:<18} {:<10} {:<36} {}", "FIRES AT", "KIND", "TITLE", "BODY");
    println!("{}", "-".repeat(80));
    for r in reminders {
        let kind = match r.kind {
            ReminderKind::Configured => "reminder",
            ReminderKind::HighPriority => "priority",
        };
        println!(
            "{:<18} {:<10} {:<36} {}",
            r.fire_at.with_timezone(&tz).format("%Y-%m-%d %H:%M"),
            kind,
            truncate(&r.title, 34),
            r.body,
        );
    }
    println!();
    println!("{} reminders", reminders.len());
}
