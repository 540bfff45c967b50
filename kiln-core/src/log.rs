// Copyright (c) 2019-present Dmitry Stepanov and Fyrox Engine contributors.
//
// Permission is hereby granted, free of charge, to any person obtaining a copy
// of this software and associated documentation files (the "Software"), to deal
// in the Software without restriction, including without limitation the rights
// to use, copy, modify, merge, publish, distribute, sublicense, and/or sell
// copies of the Software, and to permit persons to whom the Software is
// furnished to do so, subject to the following conditions:
//
// The above copyright notice and this permission notice shall be included in all
// copies or substantial portions of the Software.
//
// THE SOFTWARE IS PROVIDED "AS IS", WITHOUT WARRANTY OF ANY KIND, EXPRESS OR
// IMPLIED, INCLUDING BUT NOT LIMITED TO THE WARRANTIES OF MERCHANTABILITY,
// FITNESS FOR A PARTICULAR PURPOSE AND NONINFRINGEMENT. IN NO EVENT SHALL THE
// AUTHORS OR COPYRIGHT HOLDERS BE LIABLE FOR ANY CLAIM, DAMAGES OR OTHER
// LIABILITY, WHETHER IN AN ACTION OF CONTRACT, TORT OR OTHERWISE, ARISING FROM,
// OUT OF OR IN CONNECTION WITH THE SOFTWARE OR THE USE OR OTHER DEALINGS IN THE
// SOFTWARE.

//! Simple logger that writes into the console. Every message is also forwarded to subscribed
//! listeners, which is how editor panels (and tests) observe what the inspector reports.

use crate::parking_lot::Mutex;
use fxhash::FxHashMap;
use std::{
    collections::hash_map::Entry,
    io::{self, Write},
    sync::{
        mpsc::{self, Receiver, Sender},
        LazyLock,
    },
    time::{Duration, Instant},
};

/// A message that could be sent by the logger to all listeners.
#[derive(Clone, Debug)]
pub struct LogMessage {
    /// Kind of the message: information, warning or error.
    pub kind: MessageKind,
    /// The source message without logger prefixes.
    pub content: String,
    /// Time point at which the message was recorded. It is relative to the moment when the
    /// logger was initialized.
    pub time: Duration,
}

static LOG: LazyLock<Mutex<Log>> = LazyLock::new(|| {
    Mutex::new(Log {
        listeners: Default::default(),
        time_origin: Instant::now(),
        one_shot_sources: Default::default(),
    })
});

/// A kind of message.
#[derive(Debug, Default, Copy, Clone, PartialOrd, PartialEq, Eq, Ord, Hash)]
#[repr(u32)]
pub enum MessageKind {
    /// Some useful information.
    #[default]
    Information = 0,
    /// A warning.
    Warning = 1,
    /// An error of some kind.
    Error = 2,
}

impl MessageKind {
    fn prefix(self) -> &'static str {
        match self {
            MessageKind::Information => "[INFO]: ",
            MessageKind::Warning => "[WARNING]: ",
            MessageKind::Error => "[ERROR]: ",
        }
    }
}

/// See module docs.
pub struct Log {
    listeners: Vec<Sender<LogMessage>>,
    time_origin: Instant,
    one_shot_sources: FxHashMap<usize, String>,
}

impl Log {
    fn write_internal(&mut self, id: Option<usize>, kind: MessageKind, message: String) -> bool {
        if let Some(id) = id {
            match self.one_shot_sources.entry(id) {
                Entry::Occupied(mut previous) => {
                    if previous.get() == &message {
                        return false;
                    }
                    previous.insert(message.clone());
                }
                Entry::Vacant(entry) => {
                    entry.insert(message.clone());
                }
            }
        }

        let time = self.time_origin.elapsed();

        // Disconnected listeners are dropped on the first failed send.
        self.listeners.retain(|listener| {
            listener
                .send(LogMessage {
                    kind,
                    content: message.clone(),
                    time,
                })
                .is_ok()
        });

        let mut line = String::with_capacity(message.len() + 16);
        line.push_str(kind.prefix());
        line.push_str(&message);
        line.push('\n');

        let _ = io::stdout().write_all(line.as_bytes());

        true
    }

    /// Writes a line to the console.
    pub fn writeln<S>(kind: MessageKind, msg: S)
    where
        S: AsRef<str>,
    {
        LOG.lock()
            .write_internal(None, kind, msg.as_ref().to_owned());
    }

    /// Writes a line only once per given id while the message remains the same. If the message
    /// changes, the new version is printed. Useful for errors reported every frame.
    pub fn writeln_once<S>(id: usize, kind: MessageKind, msg: S) -> bool
    where
        S: AsRef<str>,
    {
        LOG.lock()
            .write_internal(Some(id), kind, msg.as_ref().to_owned())
    }

    /// Writes an information message.
    pub fn info<S>(msg: S)
    where
        S: AsRef<str>,
    {
        Self::writeln(MessageKind::Information, msg)
    }

    /// Writes a warning message.
    pub fn warn<S>(msg: S)
    where
        S: AsRef<str>,
    {
        Self::writeln(MessageKind::Warning, msg)
    }

    /// Writes error message.
    pub fn err<S>(msg: S)
    where
        S: AsRef<str>,
    {
        Self::writeln(MessageKind::Error, msg)
    }

    /// Writes an error message once. See [`Self::writeln_once`] for more info.
    pub fn err_once<S>(id: usize, msg: S) -> bool
    where
        S: AsRef<str>,
    {
        Self::writeln_once(id, MessageKind::Error, msg)
    }

    /// Creates a channel, registers its sending end as a listener and returns the receiving end.
    /// The listener receives a copy of every message and is removed automatically once the
    /// receiver is dropped.
    pub fn subscribe() -> Receiver<LogMessage> {
        let (sender, receiver) = mpsc::channel();
        LOG.lock().listeners.push(sender);
        receiver
    }
}

#[macro_export]
macro_rules! info {
    ($($arg:tt)*) => {
        $crate::log::Log::info(format!($($arg)*))
    };
}

#[macro_export]
macro_rules! warn {
    ($($arg:tt)*) => {
        $crate::log::Log::warn(format!($($arg)*))
    };
}

#[macro_export]
macro_rules! err {
    ($($arg:tt)*) => {
        $crate::log::Log::err(format!($($arg)*))
    };
}

#[cfg(test)]
mod test {
    use super::{Log, MessageKind};

    #[test]
    fn listeners_receive_messages() {
        let receiver = Log::subscribe();
        Log::warn("listener check 7f3a");
        let received = receiver
            .try_iter()
            .any(|m| m.kind == MessageKind::Warning && m.content == "listener check 7f3a");
        assert!(received);
    }

    #[test]
    fn write_once_suppresses_duplicates() {
        let id = 0xdead_beef_usize;
        assert!(Log::err_once(id, "same"));
        assert!(!Log::err_once(id, "same"));
        assert!(Log::err_once(id, "different"));
    }
}
