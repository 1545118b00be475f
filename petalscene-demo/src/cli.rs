use anyhow::{Context, Result};
use petalscene_core::voice::mock::{MockBackend, MockVoiceLog};
use petalscene_core::{
    DistanceModel, Listener, Pose, Quat, ReverbPreset, SceneDesc, SceneEvent, SceneManager,
    SoundBuffer, SourceConfig, Vec3,
};
use std::sync::Arc;

const TICK: f64 = 1.0 / 60.0;

pub fn run_scenarios(ticks: u32) -> Result<()> {
    log::info!("=== Running Flyby Scenario ===");
    flyby(ticks)?;

    log::info!("=== Running Voice Stealing Scenario ===");
    crowded_room()?;

    Ok(())
}

/// A doppler-enabled source passing the listener, with reverb switched on halfway.
fn flyby(ticks: u32) -> Result<()> {
    let backend = MockBackend::new().with_effects(true);
    let voices = backend.log();

    let listener_pose = Pose::new(Vec3::ZERO, Quat::IDENTITY);
    let scene = SceneManager::new(
        SceneDesc::default().max_voices(4).default_distance(1.0, 60.0),
        backend,
        Some(Listener::new(listener_pose)),
    );
    log::info!(
        "Listener at {:?}, forward = {:?}, up = {:?}",
        listener_pose.position,
        listener_pose.forward(),
        listener_pose.up()
    );

    let engine = Arc::new(SoundBuffer::with_duration("engine_loop", 48000, 2.5));
    let start = Vec3::new(-80.0, 0.0, -5.0);
    let car = scene
        .create(
            SourceConfig::new(engine, start)
                .looping(true)
                .priority(5.0)
                .doppler_factor(1.0)
                .distance_model(DistanceModel::LinearDistanceClamped),
        )
        .context("engine source needs a buffer")?;
    scene.play(car)?;

    if !scene.set_reverb_preset(ReverbPreset::by_name("tunnel").unwrap_or(ReverbPreset::CAVE)) {
        log::warn!("Reverb preset was rejected");
    }

    for tick in 0..ticks {
        let time = f64::from(tick) * TICK;
        let position = start + Vec3::X * (time as f32 * 30.0);
        scene.move_to(car, position, time)?;

        if tick == ticks / 2 && scene.enable_reverb(true) {
            log::info!("Reverb enabled at {:.2}s", time);
        }

        let audible = scene.update(time)?;
        report(&scene, &voices, time, audible, tick % 30 == 0);
    }

    let source = scene.source(car).context("car still registered")?;
    log::info!(
        "Car finished at {:?}, smoothed velocity {:?}, state {:?}",
        source.position(),
        source.smoothed_velocity(),
        source.state()
    );

    scene.enable_reverb(false);
    scene.close_reverb();
    scene.delete(car)?;
    log::info!("Flyby scenario completed: {:?}", scene.stats());
    Ok(())
}

/// More sources than voices: quieter and lower priority sources lose their voice.
fn crowded_room() -> Result<()> {
    let backend = MockBackend::new();
    let voices = backend.log();
    let scene = SceneManager::new(
        SceneDesc::default().max_voices(3),
        backend,
        Some(Listener::at(Vec3::ZERO)),
    );

    let chatter = Arc::new(SoundBuffer::with_duration("chatter", 44100, 4.0));
    let chime = Arc::new(SoundBuffer::with_duration("chime", 44100, 0.75));

    let mut ids = Vec::new();
    for i in 0..6 {
        let angle = i as f32 * std::f32::consts::TAU / 6.0;
        let position = Vec3::new(angle.cos(), 0.0, angle.sin()) * (2.0 + i as f32);
        let id = scene
            .create(
                SourceConfig::new(chatter.clone(), position)
                    .looping(true)
                    .gain(0.6),
            )
            .context("chatter source needs a buffer")?;
        scene.play(id)?;
        ids.push(id);
    }

    let mut time = 0.0;
    for _ in 0..30 {
        let audible = scene.update(time)?;
        report(&scene, &voices, time, audible, false);
        time += TICK;
    }

    // An important one-shot arrives close by and must win a voice
    let alert = scene
        .create(
            SourceConfig::new(chime, Vec3::new(0.0, 0.0, -1.5))
                .priority(8.0)
                .start_play_time(time + 0.1),
        )
        .context("chime source needs a buffer")?;
    scene.play(alert)?;

    for tick in 0..90 {
        let audible = scene.update(time)?;
        report(&scene, &voices, time, audible, tick % 15 == 0);
        time += TICK;
    }

    for id in ids.iter().take(2) {
        scene.stop(*id)?;
    }
    for _ in 0..5 {
        scene.update(time)?;
        time += TICK;
    }
    log_events(&scene);

    log::info!("Before clear: {:?}", scene.stats());
    scene.clear();
    log::info!("Voice stealing scenario completed: {:?}", scene.stats());
    Ok(())
}

fn report(scene: &SceneManager, voices: &MockVoiceLog, time: f64, audible: usize, verbose: bool) {
    log_events(scene);
    if !verbose {
        return;
    }
    let stats = scene.stats();
    log::info!(
        "t={:.2}s frame {}: {} audible, {}/{} voices, {} playing on the backend",
        time,
        stats.frame,
        audible,
        stats.voices_in_use,
        stats.voice_capacity,
        voices.playing_count()
    );
}

fn log_events(scene: &SceneManager) {
    for event in scene.poll_events() {
        match event {
            SceneEvent::VoiceStolen {
                victim,
                thief,
                voice,
            } => log::info!("{} took {} from {}", thief, voice, victim),
            SceneEvent::SourceFinished { source_id } => {
                log::info!("{} finished playback", source_id)
            }
            other => log::debug!("{:?}", other),
        }
    }
}
