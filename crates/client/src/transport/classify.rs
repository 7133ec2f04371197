//! Classification of transport failures into gateway status codes.

use std::error::Error as StdError;
use std::io;

use super::BodyTooLarge;
use crate::result::{BAD_GATEWAY, GATEWAY_TIMEOUT, UNKNOWN_ERROR};

/// Map a transport failure to its synthesized gateway status.
///
/// The whole `source()` chain is inspected. Priority order:
/// 1. any timeout (connect, read, or TLS handshake) -> 504
/// 2. protocol errors, malformed responses, TLS failures -> 502
/// 3. anything else (socket, DNS, I/O) -> 520
pub fn gateway_code(err: &(dyn StdError + 'static)) -> u16 {
    let mut protocol = false;
    if scan(err, &mut protocol) {
        return GATEWAY_TIMEOUT;
    }
    if protocol { BAD_GATEWAY } else { UNKNOWN_ERROR }
}

enum Failure {
    Timeout,
    Protocol,
    Other,
}

/// Walk `err` and its causes; true as soon as a timeout is found.
///
/// `io::Error::source()` skips the error it wraps, so wrapped errors (where
/// rustls failures live) are scanned explicitly.
fn scan(err: &(dyn StdError + 'static), protocol: &mut bool) -> bool {
    for cause in chain(err) {
        match failure_of(cause) {
            Failure::Timeout => return true,
            Failure::Protocol => *protocol = true,
            Failure::Other => {}
        }
        if let Some(inner) = cause.downcast_ref::<io::Error>().and_then(io::Error::get_ref)
            && scan(inner, protocol)
        {
            return true;
        }
    }
    false
}

fn failure_of(cause: &(dyn StdError + 'static)) -> Failure {
    if cause.is::<BodyTooLarge>() {
        return Failure::Protocol;
    }
    if let Some(err) = cause.downcast_ref::<reqwest::Error>() {
        if err.is_timeout() {
            return Failure::Timeout;
        }
        if err.is_decode() || err.is_redirect() {
            return Failure::Protocol;
        }
    } else if let Some(err) = cause.downcast_ref::<hyper::Error>() {
        if err.is_timeout() {
            return Failure::Timeout;
        }
        if err.is_parse() || err.is_parse_status() || err.is_incomplete_message() {
            return Failure::Protocol;
        }
    } else if let Some(err) = cause.downcast_ref::<io::Error>() {
        // TLS errors (certificate, handshake, bad records) surface as InvalidData
        return match err.kind() {
            io::ErrorKind::TimedOut => Failure::Timeout,
            io::ErrorKind::InvalidData => Failure::Protocol,
            _ => Failure::Other,
        };
    }
    Failure::Other
}

fn chain<'a>(err: &'a (dyn StdError + 'static)) -> impl Iterator<Item = &'a (dyn StdError + 'static)> {
    std::iter::successors(Some(err), |e: &&'a (dyn StdError + 'static)| (*e).source())
}
