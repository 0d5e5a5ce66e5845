use anyhow::{Result, anyhow};
use log::info;
use pico_args::Arguments;
use std::{env, path::PathBuf};

use flowheroes::config::ConfigState;
use flowheroes::controls::select_controls;
use flowheroes::game::{Game, install_shutdown_flag};
use flowheroes::gestures::{TemplateGesture, TemplateLibrary};
use flowheroes::landmarks::LandmarkSet;
use flowheroes::source::{LandmarkSource, ReplaySource, SourceError, read_recording};

pub fn run() -> Result<()> {
    let mut pargs = Arguments::from_env();

    // No args -> general help
    if env::args().len() == 1 {
        print_help();
        return Ok(());
    }

    // Flags-based help (-h/--help)
    if pargs.contains("-h") || pargs.contains("--help") {
        print_help();
        return Ok(());
    }

    // First free arg is the subcommand
    let subcmd: Option<String> = pargs.free_from_str().ok();

    match subcmd.as_deref() {
        Some("help") => {
            let topic: Option<String> = pargs.free_from_str().ok();
            if let Some(t) = topic {
                print_subcmd_help(&t);
            } else {
                print_help();
            }
            Ok(())
        }

        Some("run") => {
            let replay: Option<PathBuf> = pargs.opt_value_from_str("--replay")?;
            let ticks: Option<u64> = pargs.opt_value_from_str("--ticks")?;
            let profile: Option<String> = pargs.opt_value_from_str("--profile")?;
            cmd_run(replay, ticks, profile)
        }

        Some("classify") => {
            let registries: Vec<String> = pargs.values_from_str("--registry")?;
            let file: PathBuf = pargs
                .free_from_str()
                .map_err(|_| anyhow!("usage: flowheroes classify <recording> [--registry NAME]..."))?;
            cmd_classify(file, registries)
        }

        Some("record") => {
            let out: Option<PathBuf> = pargs.opt_value_from_str("--out")?;
            let usage = "usage: flowheroes record <name> <recording> [--out PATH]";
            let name: String = pargs.free_from_str().map_err(|_| anyhow!(usage))?;
            let file: PathBuf = pargs.free_from_str().map_err(|_| anyhow!(usage))?;
            cmd_record(name, file, out)
        }

        Some("list") => {
            let cfg = ConfigState::load_or_install_default()?;
            print_response(&serde_json::json!({
                "profiles": cfg.list_profiles(),
                "active": cfg.active_name,
            }));
            Ok(())
        }

        Some("use") => {
            let name: String = pargs
                .free_from_str()
                .map_err(|_| anyhow!("usage: flowheroes use <profile_name>"))?;
            let mut cfg = ConfigState::load_or_install_default()?;
            cfg.set_active(&name)?;
            print_response(&serde_json::json!({"active_profile": cfg.active_name}));
            Ok(())
        }

        Some("doctor") => {
            let cfg = ConfigState::load_or_install_default()?;
            print_response(&cfg.doctor_report());
            Ok(())
        }

        Some(other) => {
            eprintln!("unknown subcommand: {other}\n");
            print_help();
            Ok(())
        }

        None => {
            print_help();
            Ok(())
        }
    }
}

fn cmd_run(replay: Option<PathBuf>, ticks: Option<u64>, profile: Option<String>) -> Result<()> {
    let cfg = ConfigState::load_or_install_default()?;
    let profile = match profile {
        Some(name) => cfg.profile_named(&name)?,
        None => cfg.profile.clone(),
    };
    let templates = cfg.templates(&profile);
    let recognizer = profile.recognizer(templates.as_ref())?;
    let bindings = profile.gesture_bindings()?;
    for (name, c) in recognizer.stages() {
        info!(
            "run: {name} gestures {:?} above {}",
            c.registry().names(),
            c.threshold()
        );
    }

    let source: Result<Box<dyn LandmarkSource>, SourceError> = match replay {
        Some(path) => ReplaySource::open(&path, profile.recognition.frame_interval())
            .map(|s| Box::new(s) as Box<dyn LandmarkSource>),
        None => Err(SourceError::Unavailable(
            "no hand tracker attached (use --replay FILE)".into(),
        )),
    };
    let controls = select_controls(
        source,
        recognizer,
        bindings,
        profile.recognition.capture_timeout(),
    )?;

    let shutdown = install_shutdown_flag()?;
    let mut game = Game::new(profile.game.clone(), controls, shutdown);
    let summary = game.run(ticks)?;
    print_response(&serde_json::to_value(&summary)?);
    Ok(())
}

fn cmd_classify(file: PathBuf, registries: Vec<String>) -> Result<()> {
    let cfg = ConfigState::load_or_install_default()?;
    let mut profile = cfg.profile.clone();
    if !registries.is_empty() {
        profile.recognition.registries = registries;
    }
    let templates = cfg.templates(&profile);
    let recognizer = profile.recognizer(templates.as_ref())?;

    let frames = read_recording(&file)?;
    for (i, hands) in frames.iter().enumerate() {
        println!(
            "{}",
            serde_json::json!({
                "frame": i,
                "hands": hands.len(),
                "matches": recognizer.classify_hands(hands),
                "gestures": recognizer.classify(hands),
            })
        );
    }
    Ok(())
}

fn cmd_record(name: String, file: PathBuf, out: Option<PathBuf>) -> Result<()> {
    let frames = read_recording(&file)?;
    let singles: Vec<&LandmarkSet> = frames
        .iter()
        .filter(|hands| hands.len() == 1)
        .map(|hands| &hands[0])
        .collect();
    if singles.is_empty() {
        return Err(anyhow!("{} has no single-hand frames", file.display()));
    }

    let path = match out {
        Some(p) => p,
        None => {
            let cfg = ConfigState::load_or_install_default()?;
            cfg.templates_path(&cfg.profile)
        }
    };
    let mut lib = TemplateLibrary::load_or_default(&path)?;
    let count = singles.len();
    lib.insert(TemplateGesture::from_hands(name.as_str(), singles));
    lib.save(&path)?;
    println!(
        "ok: recorded '{name}' from {count} frames into {}",
        path.display()
    );
    Ok(())
}

fn print_help() {
    println!(
        r#"flowheroes: gesture-driven 2D action game core

USAGE:
  flowheroes help [command]                    Show general or command-specific help
  flowheroes run [--replay FILE] [--ticks N] [--profile NAME]
                                               Run the headless game loop
  flowheroes classify FILE [--registry NAME]... Classify every frame of a recording
  flowheroes record NAME FILE [--out PATH]     Store a template gesture from a recording
  flowheroes list                              List profiles
  flowheroes use <name>                        Switch active profile
  flowheroes doctor                            Show configuration and gesture report

TIPS:
  - Profiles: ~/.config/flowheroes/profiles
  - Active profile pointer: ~/.config/flowheroes/active
  - Recordings are JSON Lines: {{"hands": [[[x,y,z] x21], ...]}}
  - RUST_LOG=debug shows every gesture batch and state change
"#
    );
}

fn print_subcmd_help(cmd: &str) {
    match cmd {
        "run" => println!(
            "usage: flowheroes run [--replay FILE] [--ticks N] [--profile NAME]\nRuns the game loop. Gestures come from the replayed recording; without one the keyboard/mouse controls are used. Ctrl-C stops cleanly."
        ),
        "classify" => println!(
            "usage: flowheroes classify FILE [--registry movement|commands|spells]...\nPrints one JSON line per recorded frame with the best gesture per hand in each registry."
        ),
        "record" => println!(
            "usage: flowheroes record NAME FILE [--out PATH]\nEvery single-hand frame of FILE becomes a sample of template NAME."
        ),
        "list" => println!("usage: flowheroes list\nLists available profiles and the active one."),
        "use" => {
            println!("usage: flowheroes use <name>\nSwitches active profile to <name>.")
        }
        "doctor" => println!(
            "usage: flowheroes doctor\nShows config paths, active profile, registered gestures and templates."
        ),
        _ => {
            eprintln!("unknown command: {cmd}\n");
            print_help();
        }
    }
}

fn print_response(v: &serde_json::Value) {
    println!("{}", serde_json::to_string_pretty(v).unwrap_or_default());
}
