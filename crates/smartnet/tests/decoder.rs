use assert_approx_eq::assert_approx_eq;

use smartnet::{
    BandPlan, DecoderMessage, Mode, ObtParams, SmartnetDecoder, SmartnetDecoderBuilder,
    TrunkEvent, TrunkEventKind, M_SMARTNET_BAD_OSW, M_SMARTNET_OSW, PROTOCOL_SMARTNET,
};

const OBT: BandPlan = BandPlan::Obt(ObtParams {
    base_mhz: 406.0125,
    spacing_mhz: 0.0125,
    offset: 380,
});

fn osw(ts: f64, addr: u16, group: bool, cmd: u16) -> DecoderMessage {
    DecoderMessage::Osw {
        ts,
        addr,
        group,
        cmd,
    }
}

// Words which match nothing, every `step` seconds in [start, end)
fn fill(start: f64, end: f64, step: f64) -> Vec<DecoderMessage> {
    let mut out = vec![];
    let mut ts = start;
    while ts < end {
        out.push(osw(ts, 0x0000, false, 0x3ff));
        ts += step;
    }
    out
}

fn feed(decoder: &mut SmartnetDecoder, input: Vec<DecoderMessage>) -> Vec<TrunkEvent> {
    decoder.iter(input).collect()
}

fn domestic() -> SmartnetDecoder {
    SmartnetDecoderBuilder::new(BandPlan::Domestic800).build()
}

#[test]
fn test_band_plan_example() {
    let plan = BandPlan::Domestic800;
    assert!(plan.is_channel(0x100, false));
    assert_approx_eq!(857.4125, plan.resolve_frequency(0x100, false));
    assert_approx_eq!(812.4125, plan.resolve_frequency(0x100, true));

    for plan in [
        BandPlan::Domestic800,
        BandPlan::Splinter800,
        BandPlan::Rebanded800,
        BandPlan::Band900,
        OBT,
    ] {
        for chan in 0..0x400u16 {
            if plan.is_channel(chan, false) {
                assert!(plan.resolve_frequency(chan, false) > 0.0, "{} {:#x}", plan, chan);
            }
        }
    }
}

#[test]
fn test_grant_counter_monotonic() {
    let mut dec = domestic();

    let mut input = vec![osw(10.0, 1234, true, 0x321), osw(10.1, 0x2460, true, 0x100)];
    input.extend(fill(10.2, 11.0, 0.1));
    input.push(osw(20.0, 1234, true, 0x321));
    input.push(osw(20.1, 0x2460, true, 0x100));
    input.extend(fill(20.2, 21.0, 0.1));

    let events = feed(&mut dec, input);
    assert_eq!(2, events.len());
    assert!(events.iter().all(|e| e.kind == TrunkEventKind::Grant));

    let vf = dec
        .registry()
        .voice_frequency(857_412_500)
        .expect("missing voice frequency");
    assert_eq!(2, vf.counter);
    assert_eq!(20.1, vf.time);
    assert_eq!(Mode::Digital, vf.mode);

    let status = dec.status();
    assert_eq!(2, status.frequencies["857412500"].count);
}

#[test]
fn test_failed_nested_match_keeps_words() {
    let mut dec = domestic();

    // the third word does not confirm the system ID, but is
    // itself a control channel broadcast
    let mut input = vec![
        osw(1.0, 0x2a3c, false, 0x308),
        osw(1.1, 0x2901, true, 0x30b),
        osw(1.2, 0x1f00, false, 0x100),
    ];
    input.extend(fill(1.3, 2.5, 0.1));
    assert!(feed(&mut dec, input).is_empty());
    assert_eq!(0, dec.session().system_id());
    assert_eq!(857_412_500, dec.session().control_channel_hz());

    // the lookahead of a failed two-word message is decoded next
    let mut input = vec![
        osw(3.0, 1234, false, 0x321),
        osw(3.1, 0x2468, true, 0x120),
    ];
    input.extend(fill(3.2, 4.0, 0.1));
    let events = feed(&mut dec, input);
    assert_eq!(1, events.len());
    assert_eq!(TrunkEventKind::Update, events[0].kind);
    assert_eq!(0x246, events[0].talkgroup_id);
    assert!(events[0].encrypted);
    assert_eq!(0, events[0].source_radio_id);
}

#[test]
fn test_release_time_holds_talkgroup() {
    let mut dec = domestic();
    let handle = dec.registry_handle();

    let mut input = vec![osw(10.0, 1234, false, 0x308), osw(10.1, 0x2460, true, 0x100)];
    input.extend(fill(10.2, 11.0, 0.1));
    assert_eq!(1, feed(&mut dec, input).len());

    handle.set_release_time(0x2460, 50.0);
    let before = handle.talkgroup(0x2460).expect("missing talkgroup");
    assert_eq!(Mode::Analog, before.mode);

    let mut input = vec![osw(20.0, 0x2460, true, 0x120)];
    input.extend(fill(20.1, 21.0, 0.1));
    assert_eq!(1, feed(&mut dec, input).len());
    assert_eq!(before, handle.talkgroup(0x2460).expect("missing talkgroup"));

    assert!(!handle.update_talkgroup(49.9, 1, 0x2460, None, None));
    assert!(handle.update_talkgroup(50.0, 1, 0x2460, None, None));
    assert_eq!(0.0, handle.talkgroup(0x2460).unwrap().release_time);
}

#[test]
fn test_patch_fan_out_until_expiry() {
    let mut dec = domestic();
    let handle = dec.registry_handle();

    // talkgroup 116 patched onto talkgroup 100
    let mut input = vec![
        osw(1.0, 0x0744, true, 0x340),
        osw(1.1, 0x0064, true, 0x3ff),
        osw(2.0, 0x0640, true, 0x100),
    ];
    input.extend(fill(2.25, 4.0, 0.25));
    let events = feed(&mut dec, input);
    assert_eq!(1, events.len());
    assert_eq!(100, events[0].talkgroup_id);

    assert_eq!(vec![0x0740], handle.patched_to(0x0640));
    let secondary = handle.talkgroup(0x0740).expect("secondary not updated");
    assert_eq!(2.0, secondary.time);
    assert_eq!(857_412_500, secondary.frequency);

    // no renewal: the patch lapses
    let mut input = fill(4.0, 8.0, 0.25);
    input.push(osw(8.0, 0x0640, true, 0x120));
    input.extend(fill(8.25, 10.0, 0.25));
    assert_eq!(1, feed(&mut dec, input).len());

    assert!(handle.patched_to(0x0640).is_empty());
    assert!(handle.patches().is_empty());
    assert_eq!(8.0, handle.talkgroup(0x0640).unwrap().time);
    assert_eq!(2.0, handle.talkgroup(0x0740).unwrap().time);
}

#[test]
fn test_adjacent_site_expires_from_status() {
    let mut dec = SmartnetDecoderBuilder::new(OBT).with_system_number(9).build();

    // adjacent site 3 on receive channel 400
    let mut input = vec![
        osw(1.0, 0x2a3c, true, 16),
        osw(1.1, 0x0800, true, 0x320),
        osw(1.2, 0x6190, true, 0x30b),
    ];
    input.extend(fill(1.5, 30.0, 0.5));
    assert!(feed(&mut dec, input).is_empty());

    assert_eq!(0x2a3c, dec.session().system_id());
    let status = dec.status();
    assert_eq!(9, status.system);
    assert_eq!(1, status.adjacent_sites.len());
    assert_eq!(3, status.adjacent_sites[0].site);
    assert_approx_eq!(406.2625, status.adjacent_sites[0].rx_freq);
    assert_eq!(0.0, status.adjacent_sites[0].tx_freq);

    feed(&mut dec, fill(30.0, 60.0, 0.5));
    assert_eq!(1, dec.status().adjacent_sites.len());

    feed(&mut dec, fill(60.0, 63.0, 0.5));
    let status = dec.status();
    assert!(status.adjacent_sites.is_empty());
    let json: serde_json::Value = serde_json::from_str(&status.to_json().unwrap()).unwrap();
    assert_eq!(0, json["adjacent_sites"].as_array().unwrap().len());
}

#[test]
fn test_alternate_cc_sets_site() {
    let mut dec = SmartnetDecoderBuilder::new(OBT).build();

    let mut input = vec![
        osw(1.0, 0x2a3c, true, 16),
        osw(1.1, 0x0800, true, 0x320),
        osw(1.2, 0x6190, false, 0x30b),
    ];
    input.extend(fill(1.5, 4.0, 0.5));
    feed(&mut dec, input);

    assert_eq!(3, dec.session().site_id());
    let status = dec.status();
    assert_eq!(1, status.alternate_cc_freqs.len());
    assert!(status.top_line.starts_with("Smartnet System ID 10812 Site 3 OSW count"));
}

#[test]
fn test_reset_discards_buffered_words() {
    let mut dec = domestic();

    // three updates never reach the matcher
    let mut input = vec![
        osw(1.0, 0x2460, true, 0x100),
        osw(1.1, 0x2460, true, 0x100),
        osw(1.2, 0x2460, true, 0x100),
        DecoderMessage::BadFrame { ts: 1.3 },
    ];
    input.extend(fill(1.4, 3.0, 0.1));
    assert!(feed(&mut dec, input).is_empty());
    assert_eq!(0, dec.registry().voice_frequencies().count());

    // a grant split by a reset is not a grant
    let mut input = vec![
        osw(4.0, 1234, true, 0x321),
        DecoderMessage::BadFrame { ts: 4.1 },
        osw(4.2, 0x2460, true, 0x100),
    ];
    input.extend(fill(4.3, 5.0, 0.1));
    let events = feed(&mut dec, input);
    assert_eq!(1, events.len());
    assert_eq!(TrunkEventKind::Update, events[0].kind);
}

#[test]
fn test_raw_messages() {
    let mut dec = domestic();
    let osw_type = DecoderMessage::raw_type(PROTOCOL_SMARTNET, M_SMARTNET_OSW);
    let bad_type = DecoderMessage::raw_type(PROTOCOL_SMARTNET, M_SMARTNET_BAD_OSW);

    let mut events = vec![];
    events.extend(dec.process_raw(osw_type, 1.0, &[0x04, 0xd2, 0x01, 0x03, 0x21]));
    events.extend(dec.process_raw(osw_type, 1.1, &[0x24, 0x60, 0x01, 0x01, 0x00]));
    // malformed messages change nothing
    events.extend(dec.process_raw(osw_type, 1.2, &[0x24, 0x60]));
    events.extend(dec.process_raw(0x0001_0000, 1.2, &[0x24, 0x60, 0x01, 0x01, 0x00]));
    for i in 0..4 {
        events.extend(dec.process_raw(osw_type, 2.0 + i as f64, &[0, 0, 0, 0x03, 0xff]));
    }
    assert_eq!(1, events.len());
    assert_eq!(TrunkEventKind::Grant, events[0].kind);
    assert_eq!(6, dec.session().osw_count());

    assert!(dec.process_raw(bad_type, 10.0, &[]).is_empty());
    assert_eq!(1, dec.window().len());
}
