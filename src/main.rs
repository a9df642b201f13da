//! Command-line PDU tool.
//!
//! Reads lines from stdin. A plain hex line is decoded and described; a line of the form
//! `send <recipient>;<message>` is encoded into SMS-SUBMIT PDUs (7-bit if possible, UCS2
//! otherwise), and `ussd <command>` encodes a USSD string. Set `RUST_LOG=debug` (or `trace`) to
//! see what the decoder is doing.
#[macro_use] extern crate log;

use std::io::prelude::*;
use gsm_pdu::{Pdu, PduAddress, OutgoingMessage, MessageEncoding, ussd_encode};
use gsm_pdu::gsm_encoding::try_gsm_encode_string;

fn describe(pdu: &Pdu) {
    println!("Type: {}", pdu.tpdu_type());
    if let Some(sca) = pdu.sca() {
        println!("SMSC: {}", sca);
    }
    match *pdu {
        Pdu::Deliver(ref d) | Pdu::Unknown(ref d) => {
            println!("Sender: {}", d.originating_address);
            println!("Sent: {}", d.scts);
            println!("Encoding: {:?} (DCS {:02X})", d.encoding, d.dcs);
        },
        Pdu::Submit(ref s) => {
            println!("Recipient: {}", s.destination);
            println!("Encoding: {:?} (DCS {:02X})", s.encoding, s.dcs);
        },
        Pdu::StatusReport(ref s) => {
            println!("Message reference: {}", s.message_reference);
            println!("Recipient: {}", s.recipient);
            println!("Submitted: {}", s.smsc_ts);
            println!("Discharged: {}", s.discharge_ts);
            println!("Status: {}", s.status_hex());
        }
    }
    if let Some(concat) = pdu.udh().and_then(|u| u.concatenation()) {
        println!("Part {} of {} (reference {})", concat.sequence, concat.parts, concat.reference);
    }
    if let Some(text) = pdu.text() {
        println!("Text: {}", text);
    }
}
fn send(line: &str) {
    let mut split = line.splitn(2, ';');
    let (recipient, text) = match (split.next(), split.next()) {
        (Some(r), Some(t)) => (r, t),
        _ => {
            error!("expected send <recipient>;<message>");
            return;
        }
    };
    let recipient: PduAddress = match recipient.trim().parse() {
        Ok(r) => r,
        Err(e) => match e {}
    };
    let encoding = if try_gsm_encode_string(text).is_some() {
        MessageEncoding::Gsm7Bit
    }
    else {
        MessageEncoding::Ucs2
    };
    match OutgoingMessage::new(recipient, text, encoding).generate() {
        Ok(frags) => {
            for frag in frags {
                println!("AT+CMGS={}", frag.tpdu_length);
                println!("{}", frag);
            }
        },
        Err(e) => error!("failed to encode message: {}", e)
    }
}
fn main() {
    if let Err(e) = env_logger::init() {
        eprintln!("failed to set up logging: {}", e);
    }
    println!("Input PDUs, `send <recipient>;<message>` or `ussd <command>`");
    let stdin = ::std::io::stdin();
    let lock = stdin.lock();
    for ln in lock.lines() {
        let ln = match ln {
            Ok(l) => l,
            Err(e) => {
                error!("failed to read stdin: {}", e);
                break;
            }
        };
        let ln = ln.trim();
        if ln.is_empty() {
            continue;
        }
        if ln.starts_with("send ") {
            send(&ln[5..]);
        }
        else if ln.starts_with("ussd ") {
            match ussd_encode(&ln[5..]) {
                Ok(hex) => println!("{}", hex),
                Err(e) => error!("failed to encode USSD: {}", e)
            }
        }
        else {
            match Pdu::parse(ln) {
                Ok(pdu) => describe(&pdu),
                Err(e) => error!("failed to decode PDU: {}", e)
            }
        }
    }
}
