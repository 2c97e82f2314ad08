//! The `cut` command: run the take-selection pipeline over one recording
//! and write the edit artifacts.
//!
//! Output handling follows the per-format isolation rule: a failed
//! export is reported but does not stop the remaining artifacts from
//! being written; the command then fails with the first export error.

use crate::cli::{CutArgs, ui};
use crate::config::{Config, ConfigService};
use crate::core::export::{render_edl, render_report, render_xmeml};
use crate::core::pipeline::{Pipeline, progress_channel};
use crate::core::session::{ProgressEvent, Session, SessionState};
use crate::services::media::{FfmpegEngine, OutputContainer};
use crate::services::scoring::OpenAiOracle;
use crate::services::transcription::WhisperApiClient;
use crate::{Result, error::CutterError};
use colored::Colorize;
use log::debug;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::sync::mpsc;

/// Execute the cut pipeline.
pub async fn execute(args: CutArgs, config_service: Arc<dyn ConfigService>) -> Result<()> {
    let mut config = config_service.get_config()?;
    args.apply_to(&mut config)?;

    if !args.input.exists() {
        return Err(CutterError::source_unreadable(
            &args.input,
            "file does not exist",
        ));
    }

    let engine = Arc::new(FfmpegEngine::new(&config.engine)?);
    let speech = Arc::new(WhisperApiClient::new(
        config.transcription.api_key.clone(),
        config.transcription.clone(),
    )?);
    // Surfaces a missing credential before any engine work starts.
    let oracle = Arc::new(OpenAiOracle::from_config(&config.scoring)?);

    let (progress_tx, progress_rx) = progress_channel();
    let display = tokio::spawn(drive_progress(progress_rx));

    let pipeline = Pipeline::new(engine, speech, oracle, progress_tx);
    let run_result = pipeline.run(&args.input, &config).await;
    let (mut session, handle) = match run_result {
        Ok(ready) => ready,
        Err(e) => {
            drop(pipeline);
            let _ = display.await;
            return Err(e);
        }
    };

    let output_dir = resolve_output_dir(&config, &args.input);
    tokio::fs::create_dir_all(&output_dir).await?;
    let base = session.source.base_name.clone();

    let mut export_failures: Vec<CutterError> = Vec::new();
    let write_text = |name: String, format: &str, content: String| -> Option<CutterError> {
        let path = output_dir.join(name);
        match std::fs::write(&path, content) {
            Ok(()) => {
                ui::print_success(&format!("Wrote {}", path.display()));
                None
            }
            Err(e) => {
                let error = CutterError::export(format, e.to_string());
                ui::print_error(&error.user_friendly_message());
                Some(error)
            }
        }
    };

    export_failures.extend(write_text(
        format!("{base}_edit.xml"),
        "xmeml",
        render_xmeml(&session),
    ));
    export_failures.extend(write_text(
        format!("{base}_edit.edl"),
        "edl",
        render_edl(&session),
    ));
    match render_report(&session) {
        Ok(report) => {
            export_failures.extend(write_text(format!("{base}_report.json"), "report", report))
        }
        Err(e) => {
            let error = CutterError::export("report", e.to_string());
            ui::print_error(&error.user_friendly_message());
            export_failures.push(error);
        }
    }

    if args.skip_render {
        debug!("render skipped by request");
    } else {
        let container = OutputContainer::for_source(session.source.is_video);
        let cut_path = output_dir.join(format!("{base}_cut.{}", container.extension()));
        match pipeline.render(&mut session, &handle).await {
            Ok(bytes) => match tokio::fs::write(&cut_path, bytes).await {
                Ok(()) => ui::print_success(&format!("Wrote {}", cut_path.display())),
                Err(e) => {
                    let error = CutterError::export("cut", e.to_string());
                    ui::print_error(&error.user_friendly_message());
                    export_failures.push(error);
                }
            },
            Err(e) => {
                // Engine failures keep their own kind (and exit code);
                // the other artifacts are already on disk.
                ui::print_error(&e.user_friendly_message());
                export_failures.push(e);
            }
        }
    }

    drop(pipeline);
    let _ = display.await;

    print_summary(&session);

    match export_failures.into_iter().next() {
        Some(error) => Err(error),
        None => Ok(()),
    }
}

fn resolve_output_dir(config: &Config, input: &Path) -> PathBuf {
    config
        .export
        .output_dir
        .clone()
        .or_else(|| input.parent().map(Path::to_path_buf))
        .filter(|dir| !dir.as_os_str().is_empty())
        .unwrap_or_else(|| PathBuf::from("."))
}

/// Consume progress events into one progress bar.
async fn drive_progress(mut rx: mpsc::Receiver<ProgressEvent>) {
    let bar = ui::create_progress_bar(100);
    while let Some(event) = rx.recv().await {
        match event {
            ProgressEvent::StateChanged(state) => {
                match &state {
                    SessionState::Extracting { done, total }
                    | SessionState::Transcribing { done, total } => {
                        if *total > 0 {
                            bar.set_position((done * 100 / total) as u64);
                        }
                    }
                    SessionState::Ready | SessionState::Done => bar.set_position(100),
                    _ => bar.set_position(0),
                }
                bar.set_message(state.to_string());
            }
            ProgressEvent::Engine(percent) | ProgressEvent::Render(percent) => {
                bar.set_position(u64::from(percent));
            }
        }
    }
    bar.finish_and_clear();
}

/// Print the per-group take table and totals after the pipeline is ready.
fn print_summary(session: &Session) {
    println!();
    println!(
        "{} {} takes in {} groups",
        "Edit summary:".bold(),
        session.segments.len(),
        session.groups.len()
    );
    for group in &session.groups {
        println!(
            "  Group {} — \"{}\"",
            group.group_id,
            group.text_summary
        );
        for &member in &group.members {
            let segment = &session.segments[member];
            let marker = if segment.is_best {
                "●".green().to_string()
            } else {
                "○".dimmed().to_string()
            };
            let score = segment
                .ai_scores
                .as_ref()
                .map(|s| format!("{:.1}", s.overall))
                .unwrap_or_else(|| "N/A".to_string());
            println!(
                "    {} take {:>3}  [{:>8.3} – {:>8.3}]  score {}",
                marker, segment.index, segment.start, segment.end, score
            );
        }
    }
    println!(
        "{} {:.3}s of {:.3}s kept",
        "Total:".bold(),
        session.edit.final_duration,
        session.edit.total_duration
    );
    if !session.overall_notes.is_empty() {
        println!("{} {}", "Notes:".bold(), session.overall_notes);
    }
}
