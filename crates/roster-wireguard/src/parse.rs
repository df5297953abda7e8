//! `WireGuard` configuration parser.
//!
//! The parser walks the input line by line. Outside a peer block it tracks
//! whether it is inside `[Interface]`; a `[Peer]` header or a
//! `### begin <name> ###` marker opens a peer block, which accumulates fields
//! until the next section header, the next peer opener, or the matching
//! `### end <name> ###` marker.
//!
//! A peer block whose first line carries the `#[disabled] ` prefix is parsed
//! as a disabled peer; the prefix is stripped from every line of that block.

use std::mem;
use std::net::IpAddr;

use once_cell::sync::Lazy;
use regex::Regex;

use crate::config::{Configuration, Peer};
use crate::error::{Result, WireGuardError};
use crate::keys::Key;
use crate::types::{
    parse_mtu, parse_persistent_keepalive, parse_port, parse_prefix, parse_table_off, split_list,
    Endpoint,
};

/// Comment tag (text after the first `#`) opening a disabled line.
const DISABLED_TAG: &str = "[disabled]";

static BEGIN_REGEX: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^## begin ([a-zA-Z0-9.@_-]+) ###\s*$").unwrap_or_else(|_| unreachable!())
});

static BEGIN_WITH_DISABLED_REGEX: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^(\[disabled\] #)?## begin ([a-zA-Z0-9.@_-]+) ###\s*$")
        .unwrap_or_else(|_| unreachable!())
});

static DISABLED_PEER_REGEX: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)^\[disabled\] \[peer\]\s*$").unwrap_or_else(|_| unreachable!()));

static END_REGEX: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^## end ([a-zA-Z0-9.@_-]+) ###\s*$").unwrap_or_else(|_| unreachable!())
});

/// Parses configuration text into a [`Configuration`] named `name`.
///
/// The whole document is rejected on the first malformed line, and after the
/// last line if the interface has no private key or any peer lacks a public
/// key.
///
/// # Errors
///
/// Returns [`WireGuardError::Parse`] describing the offending fragment.
pub fn parse_config(input: &str, name: &str) -> Result<Configuration> {
    let mut parser = Parser::new(name);
    for line in input.lines() {
        parser.feed(line)?;
    }
    parser.finish()
}

/// Where the parser is in the document.
enum State {
    Outside,
    Interface,
    Peer(PeerBlock),
}

struct Parser {
    config: Configuration,
    state: State,
}

impl Parser {
    fn new(name: &str) -> Self {
        Self {
            config: Configuration {
                name: name.to_string(),
                ..Configuration::default()
            },
            state: State::Outside,
        }
    }

    fn feed(&mut self, line: &str) -> Result<()> {
        if let State::Peer(block) = &mut self.state {
            match block.feed(line)? {
                Step::Continue => return Ok(()),
                Step::Closed => {
                    self.close_peer();
                    return Ok(());
                }
                // the line belongs to whatever comes next
                Step::Handoff => self.close_peer(),
            }
        }

        let (content, comment) = split_comment(line);
        let content = content.trim();

        if content.eq_ignore_ascii_case("[interface]") {
            self.state = State::Interface;
            return Ok(());
        }
        if opens_peer(content, comment) {
            let mut block = PeerBlock::default();
            block.feed(line)?;
            self.state = State::Peer(block);
            return Ok(());
        }
        if content.is_empty() {
            return Ok(());
        }

        if !matches!(self.state, State::Interface) {
            return Err(WireGuardError::parse("line must occur in a section", content));
        }
        let (key, value) = split_key_value(content)?;
        self.interface_key(&key, value)
    }

    fn close_peer(&mut self) {
        if let State::Peer(block) = mem::replace(&mut self.state, State::Outside) {
            self.config.peers.push(block.peer);
        }
    }

    fn interface_key(&mut self, key: &str, value: &str) -> Result<()> {
        let iface = &mut self.config.interface;
        match key {
            "privatekey" => iface.private_key = Key::from_base64(value)?,
            "listenport" => iface.listen_port = parse_port(value)?,
            "mtu" => iface.mtu = parse_mtu(value)?,
            "address" => {
                for item in split_list(value)? {
                    iface.addresses.push(parse_prefix(item)?);
                }
            }
            "dns" => {
                for item in split_list(value)? {
                    match item.parse::<IpAddr>() {
                        Ok(addr) => iface.dns.push(addr),
                        Err(_) => iface.dns_search.push(item.to_string()),
                    }
                }
            }
            "preup" => iface.pre_up = value.to_string(),
            "postup" => iface.post_up = value.to_string(),
            "predown" => iface.pre_down = value.to_string(),
            "postdown" => iface.post_down = value.to_string(),
            "table" => iface.table_off = parse_table_off(value)?,
            _ => return Err(WireGuardError::parse("Invalid key for [Interface] section", key)),
        }
        Ok(())
    }

    fn finish(mut self) -> Result<Configuration> {
        self.close_peer();

        if self.config.interface.private_key.is_zero() {
            return Err(WireGuardError::parse(
                "An interface must have a private key",
                "[none specified]",
            ));
        }
        if self.config.peers.iter().any(|p| p.public_key.is_zero()) {
            return Err(WireGuardError::parse(
                "All peers must have public keys",
                "[none specified]",
            ));
        }

        self.config.deduplicate_network_entries();
        Ok(self.config)
    }
}

/// Outcome of feeding one line to a peer block.
enum Step {
    /// The line was consumed and the block stays open.
    Continue,
    /// The line was an end marker; it was consumed and the block is complete.
    Closed,
    /// The line starts something else; the block is complete and the line
    /// must be interpreted by the caller.
    Handoff,
}

/// A peer under construction.
#[derive(Default)]
struct PeerBlock {
    peer: Peer,
    started: bool,
    seen_header: bool,
}

impl PeerBlock {
    fn feed(&mut self, raw: &str) -> Result<Step> {
        if !self.started {
            self.started = true;
            let (content, comment) = split_comment(raw);
            if content.trim().is_empty() && comment.starts_with(DISABLED_TAG) {
                self.peer.disabled = true;
            }
        }
        let line = if self.peer.disabled {
            strip_disabled(raw)
        } else {
            raw
        };
        self.interpret(line)
    }

    fn interpret(&mut self, line: &str) -> Result<Step> {
        let (content, comment) = split_comment(line);
        let content = content.trim();

        if content.eq_ignore_ascii_case("[interface]")
            || (self.seen_header && opens_peer(content, comment))
        {
            return Ok(Step::Handoff);
        }
        if let Some(caps) = BEGIN_REGEX.captures(comment) {
            if self.peer.name.is_some() {
                return Err(WireGuardError::parse("Duplicate begin line", comment));
            }
            self.peer.name = Some(caps[1].to_string());
            return Ok(Step::Continue);
        }
        if content.eq_ignore_ascii_case("[peer]") {
            self.seen_header = true;
            return Ok(Step::Continue);
        }
        if END_REGEX.is_match(comment) {
            return Ok(Step::Closed);
        }
        if content.is_empty() {
            return Ok(Step::Continue);
        }

        let (key, value) = split_key_value(content)?;
        self.peer_key(&key, value)?;
        Ok(Step::Continue)
    }

    fn peer_key(&mut self, key: &str, value: &str) -> Result<()> {
        let peer = &mut self.peer;
        match key {
            "publickey" => peer.public_key = Key::from_base64(value)?,
            "presharedkey" => {
                // an all-zero preshared key means none
                peer.preshared_key = Some(Key::from_base64(value)?).filter(|k| !k.is_zero());
            }
            "allowedips" => {
                for item in split_list(value)? {
                    peer.allowed_ips.push(parse_prefix(item)?);
                }
            }
            "persistentkeepalive" => {
                peer.persistent_keepalive = parse_persistent_keepalive(value)?;
            }
            "endpoint" => peer.endpoint = Some(value.parse::<Endpoint>()?),
            _ => return Err(WireGuardError::parse("Invalid key for [Peer] section", key)),
        }
        Ok(())
    }
}

/// Splits a line at its first `#` into content and comment text.
fn split_comment(line: &str) -> (&str, &str) {
    line.split_once('#').unwrap_or((line, ""))
}

/// Removes the disabled prefix from a line of a disabled block. Lines without
/// the prefix are interpreted as they are.
fn strip_disabled(line: &str) -> &str {
    let trimmed = line.trim_start();
    trimmed
        .strip_prefix("#[disabled] ")
        .or_else(|| trimmed.strip_prefix("#[disabled]"))
        .unwrap_or(line)
}

fn opens_peer(content: &str, comment: &str) -> bool {
    content.eq_ignore_ascii_case("[peer]")
        || (content.is_empty()
            && (BEGIN_WITH_DISABLED_REGEX.is_match(comment)
                || DISABLED_PEER_REGEX.is_match(comment)))
}

/// Splits `key = value`, lowercasing the key. Both sides are trimmed.
fn split_key_value(line: &str) -> Result<(String, &str)> {
    let Some((key, value)) = line.split_once('=') else {
        return Err(WireGuardError::parse(
            "Config key is missing an equals separator",
            line,
        ));
    };
    let value = value.trim();
    if value.is_empty() {
        return Err(WireGuardError::parse("Key must have a value", line));
    }
    Ok((key.trim().to_ascii_lowercase(), value))
}
