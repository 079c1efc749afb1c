//! Input parsing and event output
//!
//! Messages are read from one of two formats:
//!
//! * **text**: one message per line, for recorded logs and
//!   hand-written test cases
//!
//!   ```txt
//!   12.500 osw 2460 G 100
//!   12.525 reset
//!   ```
//!
//! * **binary**: fixed 16-byte records, for captures taken
//!   directly from a demodulator
//!
//! Every [`TrunkEvent`] is printed to standard output as one line
//! of JSON.

use std::io::{self, BufRead, ErrorKind, Read};

use anyhow::{anyhow, Context};
use byteorder::{BigEndian, ReadBytesExt};
use chrono::DateTime;
use lazy_static::lazy_static;
use log::{debug, info, warn};
use regex::Regex;

use smartnet::{
    DecoderMessage, SmartnetDecoder, TrunkEvent, OSW_PAYLOAD_LEN, PROTOCOL_SMARTNET,
};

use crate::cli::{Args, InputFormat};

/// Length of one binary record, in bytes
pub const BINARY_RECORD_LEN: usize = 16;

/// Run the application
///
/// Reads every message from `input` in the configured format and
/// feeds it to the `decoder`, printing each event unless the
/// `args` ask for quiet. Stops at end of input.
pub fn run<R>(args: &Args, decoder: &mut SmartnetDecoder, input: R) -> Result<(), anyhow::Error>
where
    R: BufRead,
{
    let mut num_events = 0usize;
    let mut emit = |events: Vec<TrunkEvent>| -> Result<(), anyhow::Error> {
        for evt in events {
            num_events += 1;
            if !args.quiet {
                println!("{}", serde_json::to_string(&evt)?);
            }
        }
        Ok(())
    };

    match args.format {
        InputFormat::Text => run_text(decoder, input, &mut emit)?,
        InputFormat::Binary => {
            let mut input = input;
            while let Some((raw_type, ts, payload)) = read_record(&mut input)? {
                emit(decoder.process_raw(raw_type, ts, &payload))?;
            }
        }
    }

    info!(
        "end of input: {} OSWs, {} events",
        decoder.session().osw_count(),
        num_events
    );
    Ok(())
}

/// Feed text input to the decoder, one message per line
///
/// Lines which are not UTF-8 or do not parse are logged and
/// skipped. Only I/O errors and errors from `emit` stop the run.
pub fn run_text<R, F>(
    decoder: &mut SmartnetDecoder,
    mut input: R,
    mut emit: F,
) -> Result<(), anyhow::Error>
where
    R: BufRead,
    F: FnMut(Vec<TrunkEvent>) -> Result<(), anyhow::Error>,
{
    let mut buf = Vec::new();
    let mut lineno = 0usize;
    loop {
        buf.clear();
        if input
            .read_until(b'\n', &mut buf)
            .context("unable to read input")?
            == 0
        {
            return Ok(());
        }
        lineno += 1;

        let line = match std::str::from_utf8(&buf) {
            Ok(line) => line,
            Err(err) => {
                warn!("line {}: not UTF-8: {}", lineno, err);
                continue;
            }
        };
        match parse_line(line) {
            Ok(Some(msg)) => emit(decoder.process(msg))?,
            Ok(None) => {}
            Err(err) => warn!("line {}: {}", lineno, err),
        }
    }
}

/// Parse one line of text input
///
/// Returns `Ok(None)` for blank lines and comments.
pub fn parse_line(line: &str) -> Result<Option<DecoderMessage>, anyhow::Error> {
    lazy_static! {
        static ref LINE: Regex = Regex::new(
            r"(?x)
            ^(?P<ts>\S+)\s+
            (?:
                osw\s+(?:0x)?(?P<addr>[[:xdigit:]]{1,4})\s+(?P<grp>[GI])\s+(?:0x)?(?P<cmd>[[:xdigit:]]{1,4})
                |(?P<sig>reset|timeout)
            )$"
        )
        .expect("bad line regex");
    }

    let line = line.trim();
    if line.is_empty() || line.starts_with('#') {
        return Ok(None);
    }

    let caps = LINE
        .captures(line)
        .ok_or_else(|| anyhow!("unrecognized message \"{}\"", line))?;
    let ts = parse_timestamp(&caps["ts"])?;

    let msg = match caps.name("sig").map(|m| m.as_str()) {
        Some("reset") => DecoderMessage::BadFrame { ts },
        Some(_) => DecoderMessage::Timeout { ts },
        None => DecoderMessage::Osw {
            ts,
            addr: u16::from_str_radix(&caps["addr"], 16)?,
            group: &caps["grp"] == "G",
            cmd: u16::from_str_radix(&caps["cmd"], 16)?,
        },
    };
    Ok(Some(msg))
}

/// Parse a timestamp as seconds or an RFC 3339 date-time
///
/// Date-times are converted to seconds since the UNIX epoch.
pub fn parse_timestamp(ts: &str) -> Result<f64, anyhow::Error> {
    if let Ok(secs) = ts.parse::<f64>() {
        if secs.is_finite() {
            return Ok(secs);
        }
    }

    let dt = DateTime::parse_from_rfc3339(ts)
        .with_context(|| format!("bad timestamp \"{}\"", ts))?;
    Ok(dt.timestamp() as f64 + dt.timestamp_subsec_nanos() as f64 / 1.0e9)
}

/// Read one binary record
///
/// Returns the raw message type, the timestamp, and the OSW
/// payload. Returns `Ok(None)` at a clean end of input. A
/// truncated final record is logged and discarded.
pub fn read_record<R>(input: &mut R) -> Result<Option<(u32, f64, [u8; OSW_PAYLOAD_LEN])>, io::Error>
where
    R: Read,
{
    let mut record = [0u8; BINARY_RECORD_LEN];
    let mut filled = 0;
    while filled < BINARY_RECORD_LEN {
        match input.read(&mut record[filled..]) {
            Ok(0) => break,
            Ok(n) => filled += n,
            Err(e) if e.kind() == ErrorKind::Interrupted => continue,
            Err(e) => return Err(e),
        }
    }

    if filled == 0 {
        return Ok(None);
    } else if filled < BINARY_RECORD_LEN {
        debug!("discarding truncated {}-byte record", filled);
        return Ok(None);
    }

    let mut rdr = &record[..];
    let subtype = rdr.read_u16::<BigEndian>()?;
    let ts = rdr.read_f64::<BigEndian>()?;
    let mut payload = [0u8; OSW_PAYLOAD_LEN];
    rdr.read_exact(&mut payload)?;

    let raw_type = DecoderMessage::raw_type(PROTOCOL_SMARTNET, subtype);
    Ok(Some((raw_type, ts, payload)))
}

#[cfg(test)]
mod tests {
    use super::*;

    use byteorder::WriteBytesExt;
    use smartnet::SmartnetDecoderBuilder;

    #[test]
    fn test_parse_line() {
        assert_eq!(
            Some(DecoderMessage::Osw {
                ts: 12.5,
                addr: 0x2460,
                group: true,
                cmd: 0x100
            }),
            parse_line("12.5 osw 2460 G 100").unwrap()
        );
        assert_eq!(
            Some(DecoderMessage::Osw {
                ts: 1.0,
                addr: 0x1f00,
                group: false,
                cmd: 0x2f8
            }),
            parse_line("  1 osw 0x1f00 I 0x2f8  ").unwrap()
        );
        assert_eq!(
            Some(DecoderMessage::BadFrame { ts: 3.0 }),
            parse_line("3 reset").unwrap()
        );
        assert_eq!(
            Some(DecoderMessage::Timeout { ts: 4.25 }),
            parse_line("4.25 timeout").unwrap()
        );

        assert_eq!(None, parse_line("").unwrap());
        assert_eq!(None, parse_line("# comment").unwrap());

        assert!(parse_line("12.5 osw 2460 X 100").is_err());
        assert!(parse_line("12.5 osw 12345 G 100").is_err());
        assert!(parse_line("soon osw 2460 G 100").is_err());
    }

    #[test]
    fn test_run_text_skips_garbage() {
        let input: &[u8] = b"1 osw 04d2 G 321\n\
            \xff\xfe garbage\n\
            2 osw 2460 G 100\n\
            not a message\n\
            3 osw 0 I 3ff\n\
            3.1 osw 0 I 3ff\n\
            3.2 osw 0 I 3ff\n\
            3.3 osw 0 I 3ff\n";

        let mut decoder = SmartnetDecoderBuilder::default().build();
        let mut events = vec![];
        run_text(&mut decoder, input, |evts| {
            events.extend(evts);
            Ok(())
        })
        .expect("run failed");

        assert_eq!(1, events.len());
        assert_eq!(0x246, events[0].talkgroup_id);
        assert_eq!(1234, events[0].source_radio_id);
        assert_eq!(6, decoder.session().osw_count());
    }

    #[test]
    fn test_parse_timestamp() {
        assert_eq!(10.5, parse_timestamp("10.5").unwrap());
        assert_eq!(
            1616883240.5,
            parse_timestamp("2021-03-27T22:14:00.5Z").unwrap()
        );
        assert!(parse_timestamp("inf").is_err());
    }

    #[test]
    fn test_read_record() {
        let mut buf: Vec<u8> = vec![];
        buf.write_u16::<BigEndian>(0x0000).unwrap();
        buf.write_f64::<BigEndian>(2.5).unwrap();
        buf.extend_from_slice(&[0x24, 0x60, 0x01, 0x01, 0x00, 0x00]);
        buf.write_u16::<BigEndian>(0xfffe).unwrap();
        buf.write_f64::<BigEndian>(3.0).unwrap();
        buf.extend_from_slice(&[0u8; 6]);
        buf.extend_from_slice(&[0u8; 7]);

        let mut rdr = &buf[..];
        let (raw_type, ts, payload) = read_record(&mut rdr).unwrap().unwrap();
        assert_eq!(0x0002_0000, raw_type);
        assert_eq!(2.5, ts);
        assert_eq!([0x24, 0x60, 0x01, 0x01, 0x00], payload);

        let (raw_type, ts, _) = read_record(&mut rdr).unwrap().unwrap();
        assert_eq!(0x0002_fffe, raw_type);
        assert_eq!(3.0, ts);

        // truncated record
        assert_eq!(None, read_record(&mut rdr).unwrap());
        assert_eq!(None, read_record(&mut rdr).unwrap());
    }
}
