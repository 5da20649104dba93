use std::io::{IsTerminal, Write};
use std::time::{SystemTime, UNIX_EPOCH};

use clap::ValueEnum;
use comfy_table::{presets::UTF8_FULL, ContentArrangement, Table};
use enclink_bridge::{StatusAttribute, StatusView};
use enclink_frame::{frame_type_name, DecoderStats, Frame};
use serde::Serialize;

#[derive(Clone, Debug, Copy, ValueEnum)]
pub enum OutputFormat {
    Json,
    Table,
    Pretty,
    Raw,
}

impl OutputFormat {
    pub fn default_for_stdout() -> Self {
        if std::io::stdout().is_terminal() {
            Self::Table
        } else {
            Self::Json
        }
    }
}

#[derive(Serialize)]
struct FrameOutput<'a> {
    frame_type: u16,
    frame_type_name: &'a str,
    payload_size: usize,
    payload: String,
    timestamp: String,
}

pub fn print_frame(frame: &Frame, format: OutputFormat) {
    match format {
        OutputFormat::Json => {
            let out = FrameOutput {
                frame_type: frame.frame_type,
                frame_type_name: frame_type_name(frame.frame_type),
                payload_size: frame.payload_len(),
                payload: payload_preview(frame.payload()),
                timestamp: now_unix_seconds(),
            };
            print_json(&out);
        }
        OutputFormat::Table => {
            let mut table = Table::new();
            table
                .load_preset(UTF8_FULL)
                .set_content_arrangement(ContentArrangement::Dynamic)
                .set_header(vec!["TYPE", "NAME", "SIZE", "PAYLOAD"])
                .add_row(vec![
                    format!("0x{:04X}", frame.frame_type),
                    frame_type_name(frame.frame_type).to_string(),
                    frame.payload_len().to_string(),
                    payload_preview(frame.payload()),
                ]);
            println!("{table}");
        }
        OutputFormat::Pretty => {
            println!(
                "type=0x{:04X} ({}) size={} payload={}",
                frame.frame_type,
                frame_type_name(frame.frame_type),
                frame.payload_len(),
                payload_preview(frame.payload())
            );
        }
        OutputFormat::Raw => {
            print_raw(frame.wire());
        }
    }
}

#[derive(Serialize)]
struct StatusOutput {
    root_state: u8,
    version: u8,
    timestamp: String,
}

pub fn print_status(status: &StatusView, format: OutputFormat) {
    let snapshot = status.snapshot();
    match format {
        OutputFormat::Json => {
            print_json(&StatusOutput {
                root_state: snapshot.root_state,
                version: snapshot.version,
                timestamp: now_unix_seconds(),
            });
        }
        OutputFormat::Table => {
            let mut table = Table::new();
            table
                .load_preset(UTF8_FULL)
                .set_content_arrangement(ContentArrangement::Dynamic)
                .set_header(vec!["ATTRIBUTE", "VALUE"]);
            for attr in StatusAttribute::ALL {
                table.add_row(vec![
                    attr.name().to_string(),
                    status.render(attr).trim_end().to_string(),
                ]);
            }
            println!("{table}");
        }
        OutputFormat::Pretty => {
            println!(
                "root_state={} version={}",
                snapshot.root_state, snapshot.version
            );
        }
        OutputFormat::Raw => {
            for attr in StatusAttribute::ALL {
                print!("{}", status.render(attr));
            }
            let _ = std::io::stdout().flush();
        }
    }
}

#[derive(Serialize)]
struct StatsOutput {
    frames: u64,
    resync_bytes: u64,
    overflow_resets: u64,
    pending: usize,
}

/// Print decoder counters. Raw output carries frames only, so stats are skipped.
pub fn print_stats(stats: DecoderStats, pending: usize, format: OutputFormat) {
    match format {
        OutputFormat::Json => print_json(&StatsOutput {
            frames: stats.frames,
            resync_bytes: stats.resync_bytes,
            overflow_resets: stats.overflow_resets,
            pending,
        }),
        OutputFormat::Table => {
            let mut table = Table::new();
            table
                .load_preset(UTF8_FULL)
                .set_content_arrangement(ContentArrangement::Dynamic)
                .set_header(vec!["FRAMES", "RESYNC BYTES", "OVERFLOW RESETS", "PENDING"])
                .add_row(vec![
                    stats.frames.to_string(),
                    stats.resync_bytes.to_string(),
                    stats.overflow_resets.to_string(),
                    pending.to_string(),
                ]);
            println!("{table}");
        }
        OutputFormat::Pretty => {
            println!(
                "frames={} resync_bytes={} overflow_resets={} pending={}",
                stats.frames, stats.resync_bytes, stats.overflow_resets, pending
            );
        }
        OutputFormat::Raw => {}
    }
}

#[derive(Serialize)]
struct SendOutput<'a> {
    frame_type: Option<u16>,
    frame_type_name: Option<&'a str>,
    requested: usize,
    written: usize,
}

pub fn print_send(frame_type: Option<u16>, requested: usize, written: usize, format: OutputFormat) {
    match format {
        OutputFormat::Json => print_json(&SendOutput {
            frame_type,
            frame_type_name: frame_type.map(frame_type_name),
            requested,
            written,
        }),
        OutputFormat::Table => {
            let mut table = Table::new();
            table
                .load_preset(UTF8_FULL)
                .set_content_arrangement(ContentArrangement::Dynamic)
                .set_header(vec!["TYPE", "REQUESTED", "WRITTEN"])
                .add_row(vec![
                    frame_type
                        .map(|t| format!("0x{t:04X}"))
                        .unwrap_or_else(|| "raw".to_string()),
                    requested.to_string(),
                    written.to_string(),
                ]);
            println!("{table}");
        }
        OutputFormat::Pretty => {
            println!("sent {written}/{requested} bytes");
        }
        OutputFormat::Raw => {}
    }
}

pub fn print_raw(data: &[u8]) {
    let mut out = std::io::stdout();
    let _ = out.write_all(data);
    let _ = out.flush();
}

fn print_json<T: Serialize>(value: &T) {
    println!(
        "{}",
        serde_json::to_string(value).unwrap_or_else(|_| "{}".to_string())
    );
}

fn payload_preview(payload: &[u8]) -> String {
    match std::str::from_utf8(payload) {
        Ok(text) if !text.chars().any(char::is_control) => text.to_string(),
        _ => hex(payload),
    }
}

fn hex(data: &[u8]) -> String {
    data.iter().map(|b| format!("{b:02x}")).collect()
}

fn now_unix_seconds() -> String {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs().to_string())
        .unwrap_or_else(|_| "0".to_string())
}
