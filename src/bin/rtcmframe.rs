//! RTCM frame tool
//!
//! Scans captured RTCM 2 / RTCM 3 streams for frames and wraps raw message
//! bodies into RTCM 3 frames.
//!
//! Usage:
//!   rtcmframe scan capture.rtcm3 --format rtcm3
//!   rtcmframe wrap body.bin --output frame.rtcm3
//!   rtcmframe --version
//!   rtcmframe --help

use clap::{Parser, Subcommand, ValueEnum};
use rtcmframe::{
    input_reader, ByteSink, DecodeStatus, Format, Frame, FrameEvent, FrameGenerator,
    MessageCounters, MessageDecoder, RawBody, ReadStatus, Receiver, Rtcm3Generator,
    DEFAULT_CHUNK_LEN,
};
use std::fs::{self, File};
use std::io::{self, BufReader, Write};
use std::path::{Path, PathBuf};
use std::process;
use tracing::{debug, info};
use tracing_subscriber::{fmt, prelude::*, EnvFilter, Registry};

/// Command line arguments.
#[derive(Parser, Debug)]
#[command(author, version, about = "RTCM 2 / RTCM 3 frame synchronizer and generator", long_about = None)]
struct Args {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Find and verify frames in a captured stream
    Scan {
        /// Capture file to scan
        input: PathBuf,
        #[arg(short = 'f', long = "format", value_enum, default_value_t = WireFormat::Rtcm3)]
        format: WireFormat,
        #[arg(
            short = 'c',
            long = "chunk",
            help = "Bytes to process between progress reports (0 for none)",
            default_value_t = DEFAULT_CHUNK_LEN
        )]
        chunk: usize,
    },
    /// Wrap an encoded message body into an RTCM 3 frame
    Wrap {
        /// File holding the message body
        payload: PathBuf,
        #[arg(
            short = 'o',
            long = "output",
            help = "Output file. If not set, the frame is written to stdout."
        )]
        output: Option<PathBuf>,
    },
}

#[derive(Clone, Copy, Debug, ValueEnum)]
enum WireFormat {
    Rtcm2,
    Rtcm3,
}

impl From<WireFormat> for Format {
    fn from(format: WireFormat) -> Self {
        match format {
            WireFormat::Rtcm2 => Format::Rtcm2,
            WireFormat::Rtcm3 => Format::Rtcm3,
        }
    }
}

/// Decoder that only records where each frame sits.
#[derive(Debug, Default)]
struct FrameLog {
    /// Declared length of the last frame.
    last_len: usize,
    /// Station id of the last RTCM 2 frame.
    last_station: Option<u16>,
}

impl MessageDecoder for FrameLog {
    fn decode(&mut self, frame: &Frame<'_>) -> DecodeStatus {
        self.last_len = frame.declared_len();
        self.last_station = frame.rtcm2_header().map(|header| header.station_id);
        DecodeStatus::NoMessage
    }
}

/// Install the log subscriber, reading the filter from `RUST_LOG`.
fn init_logging() {
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let stderr_layer = fmt::layer().with_writer(io::stderr);
    Registry::default().with(env_filter).with(stderr_layer).init();
}

/// Scan a capture file and print one line per frame.
fn do_scan(input_path: &Path, format: Format, chunk: usize) -> Result<(), String> {
    let file = File::open(input_path).map_err(|e| format!("Cannot open input file: {e}"))?;
    let mut reader = BufReader::new(file);

    let mut receiver = Receiver::new(format, FrameLog::default())
        .map_err(|e| format!("Cannot create receiver: {e}"))?;
    let mut counters = MessageCounters::new();

    info!("scanning {} as {format}", input_path.display());

    let mut chunks = 0usize;
    loop {
        let status = input_reader(&mut receiver, &mut reader, chunk)
            .map_err(|e| format!("Failed to read input file: {e}"))?;

        let event = match status {
            ReadStatus::EndOfStream => break,
            ReadStatus::Event(event) => event,
        };
        counters.record(&event);

        match event {
            FrameEvent::NoMessage => {
                chunks += 1;
                debug!("processed {chunks} chunks");
            }
            FrameEvent::ParityError => println!("parity error"),
            FrameEvent::CrcError => println!("crc error"),
            FrameEvent::Message { message_type, .. } => {
                let log = receiver.decoder();
                match log.last_station {
                    Some(station) => println!(
                        "{format} type={message_type} len={} station={station}",
                        log.last_len
                    ),
                    None => println!("{format} type={message_type} len={}", log.last_len),
                }
            }
        }
    }

    if receiver.byte_count() > 0 {
        info!("{} bytes of an incomplete frame dropped", receiver.byte_count());
        receiver.reset();
    }

    println!("Input:       {}", input_path.display());
    println!("Summary:     {counters}");

    Ok(())
}

/// Wrap a message body into an RTCM 3 frame.
fn do_wrap(payload_path: &Path, output: Option<&Path>) -> Result<(), String> {
    let payload = fs::read(payload_path).map_err(|e| format!("Cannot read payload file: {e}"))?;

    let mut body = RawBody::new(&payload);
    let message_type = body.message_type();

    let mut generator =
        Rtcm3Generator::new().map_err(|e| format!("Cannot create generator: {e}"))?;
    let frame = generator
        .generate(&mut body, message_type, false)
        .map_err(|e| format!("Frame generation failed: {e}"))?;

    match output {
        Some(path) => {
            fs::write(path, frame).map_err(|e| format!("Cannot write output file: {e}"))?;
            println!("Input:       {} ({} bytes)", payload_path.display(), payload.len());
            println!("Output:      {} ({} bytes)", path.display(), frame.len());
            println!("Message:     type={message_type}");
        }
        None => {
            io::stdout()
                .write_all(frame)
                .map_err(|e| format!("Failed to write frame: {e}"))?;
        }
    }

    Ok(())
}

fn main() {
    let args = Args::parse();
    init_logging();

    let result = match args.command {
        Command::Scan {
            input,
            format,
            chunk,
        } => do_scan(&input, format.into(), chunk),
        Command::Wrap { payload, output } => do_wrap(&payload, output.as_deref()),
    };

    if let Err(e) = result {
        eprintln!("Error: {e}");
        process::exit(1);
    }
}
