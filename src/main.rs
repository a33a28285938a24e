// src/main.rs
//
// Offline sanity run: drives the engine the way an audio driver would,
// with the control side working between callbacks.

use log::{error, info};

use plumhost::units::{DemoGain, DemoSynth};
use plumhost::{Event, HostConfig, HostContext, RawMessage, Result, SlotRole, Unit};

fn peak(samples: &[f32]) -> f32 {
    samples.iter().fold(0.0, |p, s| p.max(s.abs()))
}

fn run() -> Result<()> {
    let config = HostConfig::default().with_block_size(256);
    let host = HostContext::new(config)?;
    let block_frames = config.block_size;

    // --------------------------------
    // Chain
    // --------------------------------

    let (mut control, mut engine) = host.create_bridge();

    let synth = DemoSynth::new(config.max_voices, host.notifier());
    let outputs: Vec<&str> = (0..synth.output_count())
        .filter_map(|ch| synth.channel_name(true, ch))
        .collect();
    info!("{} outputs: {}", synth.name(), outputs.join(", "));
    control.attach(SlotRole::Synth, Some(Box::new(synth)))?;
    control.attach(SlotRole::Effect(0), Some(Box::new(DemoGain::new())))?;

    let mut left = vec![0.0; block_frames];
    let mut right = vec![0.0; block_frames];

    // --------------------------------
    // Run a few blocks
    // --------------------------------

    info!("Starting engine sanity test");

    for block in 0..8 {
        let events: Vec<Event> = match block {
            0 => vec![
                Event::new(0, RawMessage::note_on(0, 60, 100)),
                Event::new(64, RawMessage::note_on(0, 64, 100)),
                Event::new(128, RawMessage::note_on(0, 67, 100)),
            ],
            4 => vec![
                Event::new(10, RawMessage::note_off(0, 60)),
                Event::new(10, RawMessage::note_off(0, 64)),
                Event::new(10, RawMessage::note_off(0, 67)),
            ],
            _ => Vec::new(),
        };

        if block == 2 {
            // Hot-swap the effect while the synth keeps playing.
            control.attach(SlotRole::Effect(0), Some(Box::new(DemoGain::new())))?;
            if let Some(gain) = control.controls(SlotRole::Effect(0)) {
                gain.set_parameter(0, 0.0);
            }
        }

        // Audio thread would do this:
        engine.process(block_frames, &events, &mut left, &mut right);
        control.collect_retired();

        info!(
            "block {block} @ sample {}: peak L {:.4} R {:.4}",
            engine.sample_position(),
            peak(&left),
            peak(&right)
        );
    }

    // --------------------------------
    // Presets
    // --------------------------------

    if let Some(synth) = control.controls(SlotRole::Synth) {
        if let (Some(presets), Some(storage)) = (synth.presets(), synth.storage()) {
            let bank = storage.bank_data();
            presets.set_selected_preset(4)?;
            storage.set_bank_data(&bank)?;
            info!(
                "bank round trip: {} bytes, {} presets, selected '{}'",
                bank.len(),
                presets.preset_count(),
                presets
                    .preset_name(presets.selected_preset())
                    .unwrap_or_default()
            );
        }
    }

    for notification in host.drain_notifications() {
        info!("host notification: {notification:?}");
    }

    control.detach(SlotRole::Effect(0))?;
    control.detach(SlotRole::Synth)?;
    engine.process(block_frames, &[], &mut left, &mut right);
    info!(
        "retired {} adapters after detach; output silent: {}",
        control.collect_retired(),
        peak(&left) == 0.0
    );

    info!("Sanity test completed");
    Ok(())
}

fn main() {
    tracing_subscriber::fmt::init();

    if let Err(e) = run() {
        error!("{e}");
        std::process::exit(1);
    }
}
