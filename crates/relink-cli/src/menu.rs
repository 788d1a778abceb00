//! Interactive menu loop.

use crate::commands::{self, RunSettings};
use crate::session::Session;
use anyhow::Result;
use std::io::BufRead;
use std::path::PathBuf;

const MENU: &str = "\
Import Reconciliation Tool
1. Map Current Project Structure
2. Map New Project Structure
3. Select Mapping Files
4. Set Source Truth Directory
5. Run Reconciliation
6. View Last Results
7. View Mapping File
8. Exit";

/// Outcome of reading one line of input.
enum Input {
    Line(String),
    Eof,
}

/// What the loop should do after an action.
enum Flow {
    Continue,
    Exit,
}

/// Run the menu until the user exits or input ends.
pub fn run<R: BufRead>(session: &mut Session, input: &mut R) -> Result<()> {
    loop {
        session.say("")?;
        session.say(MENU)?;

        let choice = match read(session, input, "\nEnter your choice (1-8): ")? {
            Input::Line(line) => line,
            Input::Eof => {
                session.say("Goodbye!")?;
                return Ok(());
            }
        };

        let Ok(choice) = choice.parse::<u32>() else {
            session.say("Please enter a valid number")?;
            continue;
        };

        match dispatch(session, input, choice) {
            Ok(Flow::Exit) => {
                session.say("Goodbye!")?;
                return Ok(());
            }
            Ok(Flow::Continue) => {}
            Err(e) => session.say(format!("An error occurred: {:#}", e))?,
        }
    }
}

fn dispatch<R: BufRead>(session: &mut Session, input: &mut R, choice: u32) -> Result<Flow> {
    match choice {
        1 => map_structure(session, input, "original")?,
        2 => map_structure(session, input, "new")?,
        3 => select_mapping_files(session, input)?,
        4 => set_source_dir(session, input)?,
        5 => reconcile(session)?,
        6 => view_last_results(session)?,
        7 => view_mapping(session, input)?,
        8 => return Ok(Flow::Exit),
        _ => session.say("Please choose an option between 1 and 8")?,
    }
    Ok(Flow::Continue)
}

fn map_structure<R: BufRead>(session: &mut Session, input: &mut R, prefix: &str) -> Result<()> {
    let default = session.root().to_path_buf();
    let text = format!(
        "Directory to map (Enter for {}): ",
        default.display()
    );
    let dir = match read(session, input, &text)? {
        Input::Line(line) if !line.is_empty() => PathBuf::from(line),
        _ => default,
    };

    if !dir.is_dir() {
        session.say("Invalid directory path")?;
        return Ok(());
    }

    commands::scan_project(session, &dir, Some(prefix), None)?;
    Ok(())
}

fn select_mapping_files<R: BufRead>(session: &mut Session, input: &mut R) -> Result<()> {
    let files = session.snapshot_store().list()?;
    if files.len() < 2 {
        session.say("Need at least two mapping files!")?;
        return Ok(());
    }

    commands::list_mappings(session)?;

    let Some(old_idx) = read_index(session, input, "\nSelect ORIGINAL mapping file: ", files.len())? else {
        return Ok(());
    };
    let Some(new_idx) = read_index(session, input, "Select NEW mapping file: ", files.len())? else {
        return Ok(());
    };

    session
        .config
        .select_maps(files[old_idx].path.clone(), files[new_idx].path.clone());
    session.save_config()?;
    session.say("Mapping files selected and saved")?;
    Ok(())
}

fn set_source_dir<R: BufRead>(session: &mut Session, input: &mut R) -> Result<()> {
    let current = session.config.source_truth_dir.display().to_string();
    session.say(format!("Current source truth directory: {}", current))?;

    let Input::Line(line) = read(
        session,
        input,
        "Enter new directory path (or Enter to keep current): ",
    )?
    else {
        return Ok(());
    };
    if line.is_empty() {
        return Ok(());
    }

    match session.config.set_source_truth_dir(&PathBuf::from(&line)) {
        Ok(()) => {
            session.save_config()?;
            session.say("Source truth directory updated")?;
        }
        Err(e) => session.say(e)?,
    }
    Ok(())
}

fn reconcile(session: &mut Session) -> Result<()> {
    let (old, new) = match session.config.selected_maps() {
        Ok((old, new)) => (old.to_path_buf(), new.to_path_buf()),
        Err(e) => {
            session.say(e)?;
            return Ok(());
        }
    };

    let settings = RunSettings {
        verify: true,
        ..RunSettings::default()
    };
    commands::run_reconciliation(session, &old, &new, settings)
}

fn view_last_results(session: &mut Session) -> Result<()> {
    match session.last_report.take() {
        Some(report) => {
            let result = commands::render_report(session, &report);
            session.last_report = Some(report);
            result
        }
        None => session.say("No reconciliation has been run in this session"),
    }
}

fn view_mapping<R: BufRead>(session: &mut Session, input: &mut R) -> Result<()> {
    let files = commands::list_mappings(session)?;
    if files.is_empty() {
        return Ok(());
    }

    if let Some(idx) = read_index(session, input, "\nSelect a file number to view: ", files.len())? {
        commands::show_mapping(session, &files[idx].path)?;
    }
    Ok(())
}

fn read<R: BufRead>(session: &mut Session, input: &mut R, prompt: &str) -> Result<Input> {
    session.prompt(prompt)?;

    let mut line = String::new();
    if input.read_line(&mut line)? == 0 {
        return Ok(Input::Eof);
    }
    Ok(Input::Line(line.trim().to_string()))
}

/// Read a 1-based selection and return it 0-based, or `None` if invalid.
fn read_index<R: BufRead>(
    session: &mut Session,
    input: &mut R,
    prompt: &str,
    len: usize,
) -> Result<Option<usize>> {
    let Input::Line(line) = read(session, input, prompt)? else {
        return Ok(None);
    };

    match line.parse::<usize>() {
        Ok(n) if (1..=len).contains(&n) => Ok(Some(n - 1)),
        Ok(_) => {
            session.say("Invalid selection")?;
            Ok(None)
        }
        Err(_) => {
            session.say("Please enter a valid number")?;
            Ok(None)
        }
    }
}
