use clap::builder::styling::{AnsiColor, Color, Style};
use clap::builder::Styles;
use crossterm::style::{Attribute, Stylize};
use std::io::{self, Write};
use tunecapsule::scoring::ScoreBreakdown;
use tunecapsule::season::PublishedSeason;
use unicode_width::UnicodeWidthStr;

// ═══════════════════════════════════════════════════════════════════════════════
// Clap Styles
// ═══════════════════════════════════════════════════════════════════════════════

pub fn get_styles() -> Styles {
    let yellow = Style::new()
        .bold()
        .underline()
        .fg_color(Some(Color::Ansi(AnsiColor::Yellow)));
    let green = Style::new()
        .bold()
        .fg_color(Some(Color::Ansi(AnsiColor::Green)));
    let red = Style::new()
        .bold()
        .fg_color(Some(Color::Ansi(AnsiColor::Red)));
    Styles::styled()
        .usage(yellow)
        .header(yellow)
        .literal(green)
        .valid(green)
        .invalid(red)
        .error(red)
        .placeholder(Style::new().fg_color(Some(Color::Ansi(AnsiColor::BrightBlack))))
}

// ═══════════════════════════════════════════════════════════════════════════════
// Palette
// ═══════════════════════════════════════════════════════════════════════════════

mod colors {
    use crossterm::style::Color;

    pub const TAPE: Color = Color::Rgb {
        r: 255,
        g: 191,
        b: 0,
    };
    pub const LABEL: Color = Color::Rgb {
        r: 255,
        g: 127,
        b: 80,
    };
    pub const REEL: Color = Color::Rgb {
        r: 0,
        g: 200,
        b: 190,
    };
    pub const GOOD: Color = Color::Rgb {
        r: 0,
        g: 255,
        b: 136,
    };
    pub const CAUTION: Color = Color::Rgb {
        r: 255,
        g: 165,
        b: 0,
    };
    pub const BAD: Color = Color::Rgb {
        r: 255,
        g: 85,
        b: 85,
    };
    pub const NOTE: Color = Color::Rgb {
        r: 100,
        g: 149,
        b: 237,
    };
    pub const DIM: Color = Color::Rgb {
        r: 128,
        g: 128,
        b: 128,
    };
}

const RULE: &str = "─";
const RULE_WIDTH: usize = 60;

// ═══════════════════════════════════════════════════════════════════════════════
// Outcome lines
// ═══════════════════════════════════════════════════════════════════════════════

/// How a line of command output should read.
#[derive(Clone, Copy, Debug)]
pub enum Tone {
    Done,
    Unchanged,
    Caution,
    Failed,
}

pub fn print_outcome(tone: Tone, message: &str) {
    let (mark, color) = match tone {
        Tone::Done => ("✓", colors::GOOD),
        Tone::Unchanged => ("=", colors::NOTE),
        Tone::Caution => ("!", colors::CAUTION),
        Tone::Failed => ("✗", colors::BAD),
    };
    println!(" {} {}", mark.with(color).bold(), message.with(color));
}

pub fn print_error(message: &str) {
    print_outcome(Tone::Failed, message);
}

// ═══════════════════════════════════════════════════════════════════════════════
// Sections
// ═══════════════════════════════════════════════════════════════════════════════

pub fn print_section_header(title: &str) {
    let rest = RULE_WIDTH.saturating_sub(title.width() + 4);
    println!();
    println!(
        "{} {} {}",
        RULE.repeat(2).with(colors::REEL),
        title.with(colors::TAPE).bold(),
        RULE.repeat(rest).with(colors::REEL)
    );
}

pub fn print_section_footer() {
    println!("{}", RULE.repeat(RULE_WIDTH).with(colors::REEL));
    println!();
}

pub fn print_field(key: &str, value: &str) {
    let key = format!("{:<14}", format!("{}:", key));
    println!("  {}{}", key.with(colors::DIM), value);
}

pub fn print_nothing(message: &str) {
    println!(
        "  {}",
        message.with(colors::DIM).attribute(Attribute::Italic)
    );
}

// ═══════════════════════════════════════════════════════════════════════════════
// Domain views
// ═══════════════════════════════════════════════════════════════════════════════

pub fn print_published(season: &PublishedSeason) {
    println!(
        "  {} {} {}",
        "▶".with(colors::REEL),
        format!("{} {}", season.metadata.years, season.metadata.classification)
            .with(colors::TAPE)
            .bold(),
        format!(
            "{} tracks into {}",
            season.track_count, season.metadata.playlist_id
        )
        .with(colors::DIM)
    );
    print_field(
        "Window",
        &format!(
            "{} .. {}",
            season
                .metadata
                .window
                .start
                .map_or("the beginning".to_string(), |d| d.to_string()),
            season
                .metadata
                .window
                .stop
                .map_or("now".to_string(), |d| d.to_string()),
        ),
    );
}

pub fn print_score(score: &ScoreBreakdown) {
    print_field("Street cred", &format!("{:.2}", score.cumulative));
    print_field("Heat check", &format!("{:.2}", score.snapshot));
    println!(
        "  {}{}",
        format!("{:<14}", "Overall:").with(colors::LABEL).bold(),
        format!("{:.2}", score.overall()).with(colors::GOOD).bold()
    );
}

// ═══════════════════════════════════════════════════════════════════════════════
// Tables
// ═══════════════════════════════════════════════════════════════════════════════

/// Column-aligned rows under an underlined header.
pub struct TableBuilder {
    headers: Vec<String>,
    rows: Vec<Vec<String>>,
    col_widths: Vec<usize>,
}

impl TableBuilder {
    pub fn new(headers: &[&str]) -> Self {
        TableBuilder {
            col_widths: headers.iter().map(|h| h.width()).collect(),
            headers: headers.iter().map(|h| h.to_string()).collect(),
            rows: Vec::new(),
        }
    }

    pub fn add_row(&mut self, row: Vec<String>) {
        for (width, cell) in self.col_widths.iter_mut().zip(&row) {
            *width = (*width).max(cell.width());
        }
        self.rows.push(row);
    }

    fn padded(&self, column: usize, cell: &str) -> String {
        let width = self.col_widths.get(column).copied().unwrap_or(0);
        format!("{}{}", cell, " ".repeat(width.saturating_sub(cell.width())))
    }

    pub fn print(&self) {
        let header: Vec<String> = self
            .headers
            .iter()
            .enumerate()
            .map(|(i, h)| self.padded(i, h))
            .collect();
        println!("  {}", header.join("  ").with(colors::TAPE).bold());

        let gaps = 2 * self.col_widths.len().saturating_sub(1);
        let total = self.col_widths.iter().sum::<usize>() + gaps;
        println!("  {}", RULE.repeat(total).with(colors::DIM));

        for row in &self.rows {
            let cells: Vec<String> = row
                .iter()
                .enumerate()
                .map(|(i, cell)| self.padded(i, cell))
                .collect();
            println!("  {}", cells.join("  "));
        }
    }
}

// ═══════════════════════════════════════════════════════════════════════════════
// Session
// ═══════════════════════════════════════════════════════════════════════════════

pub fn get_prompt() -> String {
    format!("{} ", "tc❯".with(colors::TAPE).bold())
}

pub fn print_welcome(db_path: &str, library_dir: &str) {
    println!();
    println!(
        "  {} {}",
        "📼 TuneCapsule".with(colors::TAPE).bold(),
        format!("{} ({})", env!("CARGO_PKG_VERSION"), env!("GIT_HASH")).with(colors::DIM)
    );
    print_field("Catalog", db_path);
    print_field("Library", library_dir);
    print_nothing("Type 'help' for available commands");
    println!();
}

pub struct CommandHelp {
    pub name: &'static str,
    pub args: &'static str,
    pub description: &'static str,
}

/// Commands grouped by what they act on.
const HELP_GROUPS: [(&str, &[&str]); 3] = [
    ("Catalog", &["classify", "score"]),
    ("Seasons", &["season", "seasons"]),
    ("System", &["where", "help", "exit"]),
];

pub fn print_help(commands: &[CommandHelp]) {
    print_section_header("Commands");
    for (group, names) in HELP_GROUPS {
        println!("  {}", group.with(colors::LABEL).bold());
        for cmd in commands.iter().filter(|c| names.contains(&c.name)) {
            println!(
                "    {} {}",
                cmd.name.with(colors::GOOD).bold(),
                cmd.args.with(colors::DIM)
            );
            println!("        {}", cmd.description);
        }
    }
    print_section_footer();
}

pub fn print_goodbye() {
    println!();
    println!("  {}", "Tape stopped. Goodbye!".with(colors::LABEL).bold());
    println!();
}

pub fn flush() {
    let _ = io::stdout().flush();
}
