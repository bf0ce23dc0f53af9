//! Example program that reads the entirety of a MIDI file event by event and writes it to a
//! second file, which should come out byte for byte identical
//!
//! `cargo run --example copy -- in.mid out.mid`, with `RUST_LOG=trace` to see every event

use smf_codec::{MidiWriteable, Smf, SmfError};
use tracing_subscriber::EnvFilter;

fn main() -> Result<(), SmfError> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    let mut args = std::env::args().skip(1);
    let (Some(input), Some(output)) = (args.next(), args.next()) else {
        eprintln!("usage: copy <input.mid> <output.mid>");
        std::process::exit(2);
    };

    let smf = Smf::open(&input)?;
    tracing::info!(
        format = ?smf.header.format,
        tracks = smf.tracks.len(),
        timing = ?smf.header.timing(),
        "decoded {input}"
    );

    for (index, track) in smf.tracks.iter().enumerate() {
        tracing::info!(
            index,
            events = track.mtrk_events.len(),
            byte_length = track.header()?.byte_length,
            terminated = track.is_terminated(),
            "track"
        );
    }

    let written = smf.save(&output)?;
    let original = std::fs::read(&input)?;
    if original == smf.to_midi_bytes()? {
        tracing::info!(written, "wrote identical copy to {output}");
    } else {
        tracing::warn!(written, "copy of {input} differs from the original");
    }

    Ok(())
}
