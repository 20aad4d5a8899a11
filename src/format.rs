//! Program summaries for chat output

use teloxide::utils::html;
use tracing::{info, warn};

use crate::db::SavedProgram;

/// Practical limit for one Telegram message
pub const MESSAGE_LIMIT: usize = 4000;

const OTHER_GROUP: &str = "Прочее";
const UNKNOWN_SUBGROUP: &str = "Неизвестная группа";

fn day_badge(day: usize) -> String {
    if day < 10 {
        format!("{}\u{fe0f}\u{20e3}", day)
    } else {
        format!("{}.", day)
    }
}

/// Group -> subgroup -> exercises, groups in first-seen order, subgroups sorted
fn group_day(program: &SavedProgram, exercises: &[String]) -> Vec<(String, Vec<(String, Vec<String>)>)> {
    let lookup = program.kind.template().subgroup_groups();
    let mut groups: Vec<(String, Vec<(String, Vec<String>)>)> = Vec::new();

    for entry in exercises {
        let (group, subgroup, name) = match entry.split_once(": ") {
            Some((subgroup, name)) => (
                lookup.get(subgroup).copied().unwrap_or(OTHER_GROUP),
                subgroup,
                name,
            ),
            None => {
                warn!("Invalid exercise format: {}", entry);
                (OTHER_GROUP, UNKNOWN_SUBGROUP, entry.as_str())
            }
        };

        let pos = match groups.iter().position(|(g, _)| g == group) {
            Some(pos) => pos,
            None => {
                groups.push((group.to_string(), Vec::new()));
                groups.len() - 1
            }
        };
        let subgroups = &mut groups[pos].1;
        match subgroups.iter_mut().find(|(s, _)| s == subgroup) {
            Some((_, names)) => names.push(name.to_string()),
            None => subgroups.push((subgroup.to_string(), vec![name.to_string()])),
        }
    }

    for (_, subgroups) in groups.iter_mut() {
        subgroups.sort_by(|a, b| a.0.cmp(&b.0));
    }
    groups
}

/// HTML summary of a saved program
pub fn format_program(program: &SavedProgram) -> String {
    let text = render(program, true);
    info!("Formatted {} ({} characters)", program.label, text.chars().count());
    text
}

/// Same layout without markup, for the terminal
pub fn format_program_plain(program: &SavedProgram) -> String {
    render(program, false)
}

fn render(program: &SavedProgram, markup: bool) -> String {
    let esc = |s: &str| if markup { html::escape(s) } else { s.to_string() };
    let bold = |s: String| if markup { format!("<b>{}</b>", s) } else { s };

    let template = program.kind.template();
    let mut text = format!(
        "🏋️ {}\n📅 Тренировок в неделю: {}\n\n",
        bold(esc(&program.label)),
        program.days
    );

    for (day, exercises) in program.body.days() {
        let title = day
            .checked_sub(1)
            .and_then(|i| template.days.get(i))
            .filter(|_| template.is_multi_day())
            .map(|d| format!(" ({})", d.title))
            .unwrap_or_default();
        let heading = bold(format!("Тренировка день {}{}", day, title));
        text.push_str(&format!("{} {}\n", day_badge(day), heading));

        for (group, subgroups) in group_day(program, exercises) {
            text.push_str(&format!("{}:\n", esc(&group)));
            for (subgroup, names) in subgroups {
                text.push_str(&format!("  {}:\n", esc(&subgroup)));
                for name in names {
                    text.push_str(&format!("    - {} ({})\n", esc(&name), esc(&program.sets_reps)));
                }
            }
        }
        text.push('\n');
    }

    text.trim_end().to_string()
}

/// Split text into chunks of at most `limit` characters, breaking at line ends
pub fn split_message(text: &str, limit: usize) -> Vec<String> {
    if text.chars().count() <= limit {
        return vec![text.to_string()];
    }

    let mut chunks = Vec::new();
    let mut current = String::new();
    let mut current_len = 0;

    for line in text.split('\n') {
        let line_len = line.chars().count();
        if current_len + line_len + 1 > limit && !current.trim().is_empty() {
            chunks.push(current.trim().to_string());
            current.clear();
            current_len = 0;
        }
        if line_len > limit {
            // a single line longer than a message is cut by characters
            let chars: Vec<char> = line.chars().collect();
            for piece in chars.chunks(limit) {
                chunks.push(piece.iter().collect());
            }
            continue;
        }
        current.push_str(line);
        current.push('\n');
        current_len += line_len + 1;
    }

    if !current.trim().is_empty() {
        chunks.push(current.trim().to_string());
    }
    chunks
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::{DayEntry, ProgramBody};
    use crate::template::{ProgramKind, SETS_REPS_STANDARD};
    use chrono::Utc;

    fn saved(kind: ProgramKind, body: ProgramBody) -> SavedProgram {
        let template = kind.template();
        SavedProgram {
            days: template.days_per_week,
            kind,
            label: template.label.to_string(),
            sets_reps: template.sets_reps.to_string(),
            body,
            saved_at: Utc::now(),
        }
    }

    #[test]
    fn test_format_groups_by_muscle() {
        let program = saved(
            ProgramKind::Hybrid3,
            ProgramBody::DayList(vec![
                DayEntry {
                    day: 1,
                    exercises: vec![
                        "Широчайшие: Подтягивания".into(),
                        "Бицепс: Молотки".into(),
                        "Верх спины: Тяга гантели к поясу".into(),
                    ],
                },
                DayEntry { day: 2, exercises: vec!["Икры: <свое>".into()] },
            ]),
        );
        let text = format_program(&program);

        assert!(text.contains("Тренировка день 1 (Фуллбоди)"));
        assert!(text.contains("Тренировка день 2 (Верх)"));
        let back = text.find("Спина:").unwrap();
        let arms = text.find("Руки:").unwrap();
        assert!(back < arms);
        // subgroups sorted within a group
        assert!(text.find("  Верх спины:").unwrap() < text.find("  Широчайшие:").unwrap());
        assert!(text.contains("&lt;свое&gt;"));
    }

    #[test]
    fn test_format_unknown_entries() {
        let program = saved(ProgramKind::FullBody2, ProgramBody::Flat(vec!["без двоеточия".into()]));
        let text = format_program(&program);
        assert!(text.contains("Прочее:"));
        assert!(text.contains("  Неизвестная группа:"));
        assert!(!text.contains("(Фуллбоди)"));
    }

    #[test]
    fn test_out_of_range_days_have_no_title() {
        let mut keyed = std::collections::BTreeMap::new();
        keyed.insert("day0".to_string(), vec!["Икры: Подъемы на носки стоя".to_string()]);
        keyed.insert("day9".to_string(), vec!["Бицепс: Молотки".to_string()]);
        let text = format_program(&saved(ProgramKind::UpperLower2, ProgramBody::DayKeyed(keyed)));
        assert!(text.contains("<b>Тренировка день 0</b>"));
        assert!(text.contains("<b>Тренировка день 9</b>"));

        let list = ProgramBody::DayList(vec![DayEntry { day: 0, exercises: vec!["Бицепс: Молотки".into()] }]);
        assert!(format_program_plain(&saved(ProgramKind::Hybrid3, list)).contains("Тренировка день 0\n"));
    }

    #[test]
    fn test_plain_has_no_markup() {
        let program = saved(ProgramKind::FullBody2, ProgramBody::Flat(vec!["Икры: <свое>".into()]));
        let text = format_program_plain(&program);
        assert!(text.starts_with("🏋️ FullBody 2.0\n"));
        assert!(!text.contains("<b>"));
        assert!(text.contains(&format!("    - <свое> ({})", SETS_REPS_STANDARD)));
    }

    #[test]
    fn test_short_text_single_chunk() {
        assert_eq!(split_message("a\nb", 10), vec!["a\nb".to_string()]);
    }

    #[test]
    fn test_split_at_line_boundaries() {
        let line = "x".repeat(30);
        let text = vec![line.clone(); 10].join("\n");
        let chunks = split_message(&text, 100);
        assert_eq!(chunks.len(), 4);
        for chunk in &chunks {
            assert!(chunk.chars().count() <= 100);
            assert!(chunk.split('\n').all(|l| l == line));
        }
        assert_eq!(chunks.join("\n"), text);
    }

    #[test]
    fn test_split_counts_characters_not_bytes() {
        let text = format!("{}\n{}", "я".repeat(60), "я".repeat(60));
        assert_eq!(split_message(&text, 100).len(), 2);
        assert_eq!(split_message(&text, 121).len(), 1);
    }

    #[test]
    fn test_overlong_line_is_cut() {
        let chunks = split_message(&"z".repeat(250), 100);
        assert_eq!(chunks.iter().map(|c| c.len()).collect::<Vec<_>>(), vec![100, 100, 50]);
    }
}
