//! Process-wide registry of virtual stream protocols and the readable
//! [`Stream`] handed to callers for large values.
//!
//! A protocol is served by a [`StreamWrapper`]: the registry creates one
//! wrapper instance per opened stream and forwards the read/eof/stat/tell
//! calls to it. The optional [`StreamContext`] carries the payload a wrapper
//! needs to open itself (for example a borrowed large-object handle).

use crate::{DbError, Error, Result, fail};
use std::{
    any::Any,
    cell::RefCell,
    collections::HashMap,
    fmt,
    io::{self, Cursor, Read},
    rc::Rc,
    sync::{LazyLock, RwLock},
};

/// Protocol handler serving one opened stream.
pub trait StreamWrapper {
    /// Prepares the wrapper, returns `false` to refuse the open.
    fn stream_open(&mut self, path: &str, mode: &str, context: Option<&StreamContext>) -> bool;
    /// Reads up to `count` bytes. An empty result means nothing is left.
    fn stream_read(&mut self, count: usize) -> io::Result<Vec<u8>>;
    fn stream_eof(&mut self) -> bool;
    fn stream_stat(&mut self) -> io::Result<StreamStat>;
    fn stream_tell(&mut self) -> io::Result<u64>;
    fn stream_close(&mut self) {}
}

pub type WrapperFactory = fn() -> Box<dyn StreamWrapper>;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct StreamStat {
    pub size: u64,
}

/// Options handed to a wrapper while it opens, keyed by protocol.
pub struct StreamContext {
    protocol: String,
    payload: Rc<dyn Any>,
}

impl StreamContext {
    pub fn new(protocol: impl Into<String>, payload: Rc<dyn Any>) -> Self {
        Self {
            protocol: protocol.into(),
            payload,
        }
    }

    pub fn protocol(&self) -> &str {
        &self.protocol
    }

    /// Payload registered for `protocol`, when it has type `T`.
    pub fn option<T: 'static>(&self, protocol: &str) -> Option<Rc<T>> {
        if self.protocol != protocol {
            return None;
        }
        self.payload.clone().downcast::<T>().ok()
    }
}

static REGISTRY: LazyLock<RwLock<HashMap<String, WrapperFactory>>> =
    LazyLock::new(|| RwLock::new(HashMap::new()));

pub struct StreamRegistry;

impl StreamRegistry {
    /// Registers `factory` for `protocol`. Returns `false` if the protocol is taken.
    pub fn register(protocol: &str, factory: WrapperFactory) -> bool {
        let mut registry = match REGISTRY.write() {
            Ok(v) => v,
            Err(poisoned) => poisoned.into_inner(),
        };
        if registry.contains_key(protocol) {
            return false;
        }
        log::debug!("Registered stream protocol `{}`", protocol);
        registry.insert(protocol.to_string(), factory);
        true
    }

    pub fn is_registered(protocol: &str) -> bool {
        match REGISTRY.read() {
            Ok(v) => v.contains_key(protocol),
            Err(poisoned) => poisoned.into_inner().contains_key(protocol),
        }
    }

    /// Opens `url` (`<protocol>://<path>`) through the registered wrapper.
    pub fn open(url: &str, mode: &str, context: Option<&StreamContext>) -> Result<Stream> {
        let Some((protocol, _)) = url.split_once("://") else {
            return fail(DbError::usage(format!(
                "Stream url `{}` does not name a protocol",
                url
            )));
        };
        let factory = match REGISTRY.read() {
            Ok(v) => v.get(protocol).copied(),
            Err(poisoned) => poisoned.into_inner().get(protocol).copied(),
        };
        let Some(factory) = factory else {
            return fail(DbError::usage(format!(
                "Unable to find the wrapper for protocol `{}`",
                protocol
            )));
        };
        let mut wrapper = factory();
        if !wrapper.stream_open(url, mode, context) {
            let error = Error::msg(format!("Failed to open stream `{}` in mode `{}`", url, mode));
            log::error!("{:#}", error);
            return Err(error);
        }
        Ok(Stream::new(Source::Wrapped {
            wrapper,
            pending: Vec::new(),
            position: 0,
            closed: false,
        }))
    }
}

enum Source {
    Memory(Cursor<Vec<u8>>),
    Wrapped {
        wrapper: Box<dyn StreamWrapper>,
        /// Bytes returned by the wrapper beyond what the caller asked for.
        pending: Vec<u8>,
        position: usize,
        closed: bool,
    },
}

impl Source {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        match self {
            Source::Memory(cursor) => cursor.read(buf),
            Source::Wrapped {
                wrapper,
                pending,
                position,
                closed,
            } => {
                if *closed || buf.is_empty() {
                    return Ok(0);
                }
                if *position >= pending.len() {
                    if wrapper.stream_eof() {
                        return Ok(0);
                    }
                    *pending = wrapper.stream_read(buf.len())?;
                    *position = 0;
                }
                let available = &pending[*position..];
                let len = available.len().min(buf.len());
                buf[..len].copy_from_slice(&available[..len]);
                *position += len;
                Ok(len)
            }
        }
    }

    fn eof(&mut self) -> bool {
        match self {
            Source::Memory(cursor) => cursor.position() as usize >= cursor.get_ref().len(),
            Source::Wrapped {
                wrapper,
                pending,
                position,
                closed,
            } => *closed || (*position >= pending.len() && wrapper.stream_eof()),
        }
    }

    fn close(&mut self) {
        if let Source::Wrapped {
            wrapper, closed, ..
        } = self
        {
            if !*closed {
                *closed = true;
                wrapper.stream_close();
            }
        }
    }
}

impl Drop for Source {
    fn drop(&mut self) {
        self.close();
    }
}

/// Readable byte stream. Clones share the same underlying stream.
#[derive(Clone)]
pub struct Stream(Rc<RefCell<Source>>);

impl Stream {
    fn new(source: Source) -> Self {
        Self(Rc::new(RefCell::new(source)))
    }

    /// In-memory stream over `bytes`, positioned at the start.
    pub fn from_bytes(bytes: impl Into<Vec<u8>>) -> Self {
        Self::new(Source::Memory(Cursor::new(bytes.into())))
    }

    pub fn from_text(text: impl Into<String>) -> Self {
        Self::from_bytes(text.into().into_bytes())
    }

    /// Reads up to `count` bytes, an empty result means end of stream.
    pub fn read_chunk(&self, count: usize) -> io::Result<Vec<u8>> {
        let mut result = vec![0; count];
        let mut filled = 0;
        while filled < count {
            let len = self.0.borrow_mut().read(&mut result[filled..])?;
            if len == 0 {
                break;
            }
            filled += len;
        }
        result.truncate(filled);
        Ok(result)
    }

    pub fn eof(&self) -> bool {
        self.0.borrow_mut().eof()
    }

    pub fn size(&self) -> io::Result<u64> {
        match &mut *self.0.borrow_mut() {
            Source::Memory(cursor) => Ok(cursor.get_ref().len() as u64),
            Source::Wrapped { wrapper, .. } => Ok(wrapper.stream_stat()?.size),
        }
    }

    pub fn tell(&self) -> io::Result<u64> {
        match &mut *self.0.borrow_mut() {
            Source::Memory(cursor) => Ok(cursor.position()),
            Source::Wrapped { wrapper, .. } => wrapper.stream_tell(),
        }
    }

    /// Reads everything left in the stream.
    pub fn contents(&self) -> Result<Vec<u8>> {
        let mut result = Vec::new();
        let mut reader = self.clone();
        reader.read_to_end(&mut result)?;
        Ok(result)
    }

    pub fn contents_string(&self) -> Result<String> {
        Ok(String::from_utf8(self.contents()?)?)
    }

    pub fn close(&self) {
        self.0.borrow_mut().close();
    }

    pub fn same_stream(&self, other: &Stream) -> bool {
        Rc::ptr_eq(&self.0, &other.0)
    }
}

impl Read for Stream {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        self.0.borrow_mut().read(buf)
    }
}

impl fmt::Debug for Stream {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let kind = match &*self.0.borrow() {
            Source::Memory(..) => "memory",
            Source::Wrapped { .. } => "wrapped",
        };
        write!(f, "Stream({}, {:p})", kind, Rc::as_ptr(&self.0))
    }
}
