//! macro-tools - roll attack tables and collect form input from the command line

use std::io;
use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{anyhow, Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use macro_tools::attack::{AttackSpec, AttackTable, CritOptions, HtmlRenderer, TextRenderer};
use macro_tools::chat::{Speaker, WriterFormat, WriterSink};
use macro_tools::dice::{DiceRoller, Formula, Roller};
use macro_tools::form::{
    FieldDefault, FieldSpec, FormResult, InputDialog, InputKind, TerminalDialog,
};
use macro_tools::script::AttackScript;
use macro_tools::Settings;
use parking_lot::Mutex;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// Attack tables and input dialogs for tabletop macros
#[derive(Parser, Debug)]
#[command(name = "macro-tools", version, about)]
struct Cli {
    /// Config file (defaults to ./macro-tools.toml if present)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Seed for reproducible rolls
    #[arg(long, global = true)]
    seed: Option<u64>,

    /// Output format
    #[arg(long, value_enum, global = true, default_value_t = OutputFormat::Html)]
    format: OutputFormat,

    #[command(subcommand)]
    command: Command,
}

#[derive(ValueEnum, Clone, Copy, Debug, PartialEq, Eq)]
enum OutputFormat {
    Html,
    Text,
    Json,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Roll a single dice formula
    Roll { formula: String },

    /// Roll one attack, with a confirmation on a threat
    Attack {
        /// Row label, e.g. "Longsword"
        #[arg(long)]
        name: String,
        /// Attack bonus or formula, e.g. "6+2" or "2d20kh+8"
        #[arg(long, allow_hyphen_values = true)]
        attack: String,
        /// Damage formula, e.g. "1d8+5"
        #[arg(long)]
        damage: String,
        /// Lowest natural roll that threatens (1-20)
        #[arg(long)]
        crit_range: Option<u8>,
        /// Confirmation bonus or formula
        #[arg(long, allow_hyphen_values = true)]
        crit_attack: Option<String>,
        /// Extra damage on a confirmed critical
        #[arg(long)]
        crit_damage: Option<String>,
        /// Table header
        #[arg(long)]
        header: Option<String>,
        /// Speaker alias
        #[arg(long)]
        speaker: Option<String>,
    },

    /// Run an attack script (TOML)
    Run { script: PathBuf },

    /// Ask for input on the terminal and print the result as JSON
    Form {
        #[arg(long, default_value = "Input")]
        title: String,
        /// label:id[:default[:text|number|checkbox]]
        #[arg(long = "field", value_parser = parse_field)]
        fields: Vec<FieldSpec>,
        /// id:label (defaults to ok:Ok)
        #[arg(long = "button", value_parser = parse_button)]
        buttons: Vec<(String, String)>,
    },
}

fn parse_field(arg: &str) -> Result<FieldSpec, String> {
    let parts: Vec<&str> = arg.splitn(4, ':').collect();
    if parts.len() < 2 {
        return Err(format!("expected label:id[:default[:kind]], got '{}'", arg));
    }
    let kind = match parts.get(3).copied() {
        None | Some("text") => InputKind::Text,
        Some("number") => InputKind::Number,
        Some("checkbox") => InputKind::Checkbox,
        Some(other) => return Err(format!("unknown field kind '{}'", other)),
    };
    let default = parts.get(2).copied().unwrap_or_default();
    let default = match kind {
        InputKind::Checkbox => FieldDefault::Checked(matches!(default, "true" | "yes" | "1" | "on")),
        _ => FieldDefault::Text(default.to_string()),
    };
    Ok(FieldSpec {
        label: parts[0].to_string(),
        id: parts[1].to_string(),
        default,
        kind,
    })
}

fn parse_button(arg: &str) -> Result<(String, String), String> {
    match arg.split_once(':') {
        Some((id, label)) => Ok((id.to_string(), label.to_string())),
        None => Ok((arg.to_string(), arg.to_string())),
    }
}

fn publish<R: DiceRoller>(
    table: &AttackTable<R>,
    format: OutputFormat,
    speaker: Option<Speaker>,
) -> Result<()> {
    if format == OutputFormat::Text {
        print!("{}", table.render_with(&TextRenderer));
        return Ok(());
    }
    let writer_format = match format {
        OutputFormat::Json => WriterFormat::Json,
        _ => WriterFormat::Plain,
    };
    let sink = WriterSink::new(io::stdout(), writer_format);
    table
        .publish(&sink, speaker)
        .context("failed to publish attack table")?;
    Ok(())
}

fn main() -> Result<()> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "macro_tools=info".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(io::stderr))
        .init();

    let cli = Cli::parse();
    let settings = Settings::load(cli.config.as_deref())?;
    let seed = cli.seed.or(settings.dice.seed);
    let renderer = HtmlRenderer::new(settings.table.clone());
    let default_speaker = settings.chat.speaker.clone();

    match cli.command {
        Command::Roll { formula } => {
            let parsed = Formula::parse(&formula)?;
            let roll = Roller::with_seed(seed).roll(&parsed);
            match cli.format {
                OutputFormat::Json => println!("{}", serde_json::to_string(&roll)?),
                _ => println!(
                    "{} = {}  {:?}  (range {}..={})",
                    roll.formula,
                    roll.total,
                    roll.faces(),
                    parsed.min(),
                    parsed.max()
                ),
            }
        }

        Command::Attack {
            name,
            attack,
            damage,
            crit_range,
            crit_attack,
            crit_damage,
            header,
            speaker,
        } => {
            let mut crit = match crit_range {
                Some(range) => CritOptions::range(range)?,
                None => CritOptions::default(),
            };
            crit.attack = crit_attack;
            crit.damage = crit_damage;

            let mut table = AttackTable::with_roller(Roller::with_seed(seed))
                .with_renderer(renderer)
                .with_user(settings.chat.user.clone());
            if let Some(header) = header {
                table = table.with_header(header);
            }
            table.add_attack(&AttackSpec::new(name, attack, damage).with_crit(crit))?;

            publish(&table, cli.format, speaker.or(default_speaker).map(Speaker::new))?;
        }

        Command::Run { script } => {
            let script = AttackScript::load(&script)?;
            let table = script
                .build(Roller::with_seed(seed), renderer)?
                .with_user(settings.chat.user.clone());
            info!(rows = table.rows().len(), "script rolled");

            let speaker = script.speaker.clone().or(default_speaker).map(Speaker::new);
            publish(&table, cli.format, speaker)?;
        }

        Command::Form {
            title,
            fields,
            buttons,
        } => {
            let mut dialog = InputDialog::new(title);
            if !buttons.is_empty() {
                dialog = dialog.with_buttons(buttons)?;
            }
            for field in fields {
                dialog.add_field(field)?;
            }

            let submitted: Arc<Mutex<Option<FormResult>>> = Arc::new(Mutex::new(None));
            let slot = submitted.clone();
            let stdin = io::stdin();
            let mut terminal = TerminalDialog::new(stdin.lock(), io::stderr());
            dialog.present(&mut terminal, move |result| {
                *slot.lock() = Some(result);
            })?;

            let result = submitted
                .lock()
                .take()
                .ok_or_else(|| anyhow!("dialog closed without a button press"))?;
            if cli.format == OutputFormat::Text {
                println!("button = {}", result.button);
                for (id, value) in &result.values {
                    println!("{} = {}", id, value);
                }
            } else {
                println!("{}", serde_json::to_string_pretty(&result)?);
            }
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_field() {
        let field = parse_field("Attack Bonus:ab:6:number").unwrap();
        assert_eq!(field.label, "Attack Bonus");
        assert_eq!(field.id, "ab");
        assert_eq!(field.kind, InputKind::Number);
        assert_eq!(field.default, FieldDefault::Text("6".to_string()));

        let field = parse_field("Hasted:hasted:true:checkbox").unwrap();
        assert_eq!(field.default, FieldDefault::Checked(true));

        let field = parse_field("Name:name").unwrap();
        assert_eq!(field.kind, InputKind::Text);
        assert_eq!(field.default, FieldDefault::Text(String::new()));

        assert!(parse_field("nolabel").is_err());
        assert!(parse_field("A:a:1:slider").is_err());
    }

    #[test]
    fn test_parse_button() {
        assert_eq!(
            parse_button("full:Full Attack").unwrap(),
            ("full".to_string(), "Full Attack".to_string())
        );
        assert_eq!(parse_button("ok").unwrap(), ("ok".to_string(), "ok".to_string()));
    }

    #[test]
    fn test_cli_parses() {
        let cli = Cli::try_parse_from([
            "macro-tools",
            "--seed",
            "5",
            "attack",
            "--name",
            "Bite",
            "--attack",
            "-1",
            "--damage",
            "1d6",
            "--crit-range",
            "19",
        ])
        .unwrap();
        assert_eq!(cli.seed, Some(5));
        match cli.command {
            Command::Attack {
                attack, crit_range, ..
            } => {
                assert_eq!(attack, "-1");
                assert_eq!(crit_range, Some(19));
            }
            other => panic!("Expected attack command, got {:?}", other),
        }
    }
}
