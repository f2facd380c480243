use jq8400_core::emulator::{Fault, SimulatedClock, SimulatedModule};
use jq8400_core::player::{
    Equalizer, LoopMode, Player, PlayerConfig, ResetPolicy, Source, Sources, Status,
};
use jq8400_core::protocol::{ProtocolError, Transport, TransportConfig};
use pretty_assertions::assert_eq;

type TestPlayer = Player<SimulatedModule, SimulatedClock>;

fn player_with(module: SimulatedModule, config: PlayerConfig) -> TestPlayer {
    let transport = Transport::new(module, SimulatedClock::new(), TransportConfig::default());
    Player::new(transport, config)
}

fn player() -> TestPlayer {
    player_with(SimulatedModule::new(), PlayerConfig::default())
}

fn module(p: &mut TestPlayer) -> &mut SimulatedModule {
    p.transport_mut().link_mut()
}

#[test]
fn test_transport_controls() {
    let mut p = player();
    p.play().unwrap();
    assert_eq!(module(&mut p).status(), Status::Playing);
    p.pause().unwrap();
    assert_eq!(p.status().unwrap(), Status::Paused);
    p.restart().unwrap();
    p.stop().unwrap();
    assert_eq!(p.status().unwrap(), Status::Stopped);

    assert_eq!(
        module(&mut p).opcodes(),
        vec![0x02, 0x03, 0x01, 0x10, 0x02, 0x10, 0x01]
    );
}

#[test]
fn test_track_and_folder_navigation() {
    let mut p = player();
    p.next().unwrap();
    p.next().unwrap();
    p.prev().unwrap();
    assert_eq!(p.current_file_index().unwrap(), 2);
    p.next_folder().unwrap();
    p.prev_folder().unwrap();
    assert_eq!(module(&mut p).opcodes(), vec![0x06, 0x06, 0x05, 0x0D, 0x0F, 0x0E]);
}

#[test]
fn test_play_and_seek_by_index() {
    let mut p = player();
    p.seek_file_by_index(7).unwrap();
    assert_eq!(module(&mut p).status(), Status::Stopped);
    assert_eq!(p.current_file_index().unwrap(), 7);

    p.play_file_by_index(0x0102).unwrap();
    assert_eq!(module(&mut p).file_index(), 0x0102);
    assert_eq!(module(&mut p).received().last().unwrap().payload(), &[0x01, 0x02][..]);
}

#[test]
fn test_interject_carries_current_source() {
    let mut p = player();
    p.interject_file_by_index(7).unwrap();
    let frames = module(&mut p).received().to_vec();
    assert_eq!(frames[0].command(), 0x0A);
    assert_eq!(frames[1].command(), 0x16);
    assert_eq!(frames[1].payload(), &[0x01, 0x00, 0x07][..]);
}

#[test]
fn test_play_file_in_folder_builds_path() {
    let mut p = player();
    p.play_file_in_folder(3, 6).unwrap();
    assert_eq!(module(&mut p).opcodes(), vec![0x0A, 0x08]);
    assert_eq!(
        module(&mut p).last_path(),
        &[0x01, b'/', b'0', b'3', b'*', b'/', b'0', b'0', b'6', b'*', b'?', b'?', b'?'][..]
    );

    p.play_in_folder(12).unwrap();
    assert_eq!(module(&mut p).last_path(), &b"\x01/12*/*???"[..]);
}

#[test]
fn test_out_of_range_folder_sends_nothing() {
    let mut p = player();
    assert!(matches!(
        p.play_file_in_folder(100, 1),
        Err(ProtocolError::InvalidArgument(_))
    ));
    assert!(p.play_file_in_folder(1, 1000).is_err());
    assert!(p.play_in_folder(250).is_err());
    assert!(module(&mut p).received().is_empty());
}

#[test]
fn test_playlists() {
    let mut p = player();
    p.play_sequence_by_file_number(&[3, 1, 12]).unwrap();
    assert_eq!(module(&mut p).last_path(), &b"030112"[..]);

    p.play_sequence_by_file_name(&[*b"1B", *b"A1"]).unwrap();
    assert_eq!(module(&mut p).last_path(), &b"1BA1"[..]);

    assert!(p.play_sequence_by_file_number(&[1u8; 128]).is_err());
}

#[test]
fn test_volume_is_scaled_and_shadowed() {
    let mut p = player();
    assert_eq!(p.volume(), 67);

    p.set_volume(50).unwrap();
    assert_eq!(module(&mut p).volume(), 15);

    p.set_volume(250).unwrap();
    assert_eq!(p.volume(), 100);
    assert_eq!(module(&mut p).volume(), 30);

    p.volume_up().unwrap();
    assert_eq!(p.volume(), 100);
    p.volume_down().unwrap();
    assert_eq!(p.volume(), 99);
    assert_eq!(module(&mut p).opcodes(), vec![0x13, 0x13, 0x14, 0x15]);
}

#[test]
fn test_equalizer_and_loop_mode() {
    let mut p = player();
    p.set_equalizer(Equalizer::Rock).unwrap();
    p.set_loop_mode(LoopMode::FolderRandom).unwrap();

    assert_eq!(p.equalizer(), Equalizer::Rock);
    assert_eq!(p.loop_mode(), LoopMode::FolderRandom);
    assert_eq!(module(&mut p).equalizer(), 2);
    assert_eq!(module(&mut p).loop_mode(), 5);
}

#[test]
fn test_sources() {
    let mut p = player_with(
        SimulatedModule::new().with_sources(Sources(0b011)),
        PlayerConfig::default(),
    );
    let sources = p.available_sources().unwrap();
    assert!(sources.usb());
    assert!(sources.sd_card());
    assert!(!sources.flash());

    p.set_source(Source::Usb).unwrap();
    assert_eq!(p.source().unwrap(), Source::Usb);
}

#[test]
fn test_file_queries() {
    let module = SimulatedModule::new()
        .with_file_count(300)
        .with_file_name("SONG01  MP3")
        .with_timing(3725, 75);
    let mut p = player_with(module, PlayerConfig::default());

    assert_eq!(p.count_files().unwrap(), 300);
    assert_eq!(p.current_file_length_secs().unwrap(), 3725);
    assert_eq!(p.current_file_name().unwrap(), "SONG01  MP3");
}

#[test]
fn test_position_query_stops_reports() {
    let mut p = player_with(
        SimulatedModule::new().with_timing(185, 75),
        PlayerConfig::default(),
    );
    assert_eq!(p.current_file_position_secs().unwrap(), 75);
    assert!(!module(&mut p).is_reporting_position());
    assert_eq!(module(&mut p).opcodes(), vec![0x25, 0x26]);
}

#[test]
fn test_position_stop_sent_even_when_query_fails() {
    let mut p = player();
    module(&mut p).inject(Fault::Silence);
    assert!(p.current_file_position_secs().unwrap_err().is_timeout());
    assert_eq!(module(&mut p).opcodes(), vec![0x25, 0x26]);
}

#[test]
fn test_seek_and_ab_loop() {
    let mut p = player_with(
        SimulatedModule::new().with_timing(185, 30),
        PlayerConfig::default(),
    );
    p.fast_forward(10).unwrap();
    assert_eq!(module(&mut p).position_secs(), 40);
    p.rewind(5).unwrap();
    assert_eq!(module(&mut p).position_secs(), 35);

    p.ab_loop_play(65, 130).unwrap();
    assert_eq!(module(&mut p).received().last().unwrap().payload(), &[1, 5, 2, 10][..]);
    assert_eq!(module(&mut p).ab_loop(), Some((65, 130)));
    p.ab_loop_clear().unwrap();
    assert_eq!(module(&mut p).ab_loop(), None);
}

#[test]
fn test_sleep_sends_both_stops() {
    let mut p = player();
    p.play().unwrap();
    p.sleep().unwrap();
    assert_eq!(module(&mut p).opcodes(), vec![0x02, 0x04, 0x10]);
    assert_eq!(module(&mut p).status(), Status::Stopped);
}

#[test]
fn test_reset_restores_defaults() {
    let mut p = player_with(SimulatedModule::new().with_boot_polls(3), PlayerConfig::default());
    p.set_volume(100).unwrap();
    p.set_equalizer(Equalizer::Pop).unwrap();
    p.play_file_by_index(5).unwrap();

    p.reset().unwrap();

    assert_eq!(p.volume(), 67);
    assert_eq!(p.equalizer(), Equalizer::Normal);
    assert_eq!(p.loop_mode(), LoopMode::OneStop);

    let m = module(&mut p);
    assert_eq!(m.volume(), 20);
    assert_eq!(m.equalizer(), 0);
    assert_eq!(m.loop_mode(), 2);
    assert_eq!(m.file_index(), 1);
    assert_eq!(m.status(), Status::Stopped);
}

#[test]
fn test_reset_gives_up_after_bounded_attempts() {
    let config = PlayerConfig {
        reset: ResetPolicy {
            attempts: 2,
            readiness_polls: 3,
            settle_delay_ms: 1,
        },
        ..PlayerConfig::default()
    };
    let mut p = player_with(SimulatedModule::new().with_boot_polls(100), config);

    assert!(matches!(
        p.reset(),
        Err(ProtocolError::NotReady { attempts: 2 })
    ));
    let polls = module(&mut p)
        .opcodes()
        .iter()
        .filter(|op| **op == 0x09)
        .count();
    assert_eq!(polls, 6);
}

#[test]
fn test_reset_survives_lost_readiness_replies() {
    let mut p = player();
    module(&mut p).inject(Fault::Silence);
    module(&mut p).inject(Fault::CorruptChecksum);
    p.reset().unwrap();
}

#[test]
fn test_corrupt_status_reply() {
    let mut p = player();
    module(&mut p).inject(Fault::CorruptChecksum);
    assert!(matches!(
        p.status(),
        Err(ProtocolError::ChecksumMismatch { .. })
    ));
    assert_eq!(p.status().unwrap(), Status::Stopped);
}

#[test]
fn test_noise_on_the_line_is_drained() {
    let mut p = player();
    module(&mut p).inject_noise(&[0xAA, 0x01, 0x01, 0x02, 0xAE]);
    module(&mut p).inject(Fault::TrailingNoise(vec![0x00, 0xAA]));
    assert_eq!(p.count_files().unwrap(), 10);
    assert_eq!(p.current_file_index().unwrap(), 1);
    assert_eq!(module(&mut p).pending(), 0);
}
