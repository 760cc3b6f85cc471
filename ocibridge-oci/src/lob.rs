//! Large objects exposed as readable streams.
//!
//! A [`LobSlot`] is the statement side owner of a large object handle. The
//! stream only ever holds a weak reference to it: once the owning statement
//! releases the slot, reads fail instead of touching a freed handle.

use crate::{LobHandle, OciNative};
use ocibridge_core::{Result, Stream, StreamContext, StreamRegistry, StreamStat, StreamWrapper};
use std::{
    cell::Cell,
    io,
    rc::{Rc, Weak},
    sync::Once,
};

/// Protocol the large object wrapper is registered under.
pub const PROTOCOL: &str = "ocipdolob";

/// Operations a stream needs from a large object.
pub trait LobAccess {
    fn read(&self, count: usize) -> Option<Vec<u8>>;
    fn eof(&self) -> bool;
    fn rewind(&self) -> bool;
    fn size(&self) -> Option<u64>;
    fn tell(&self) -> Option<u64>;
    /// Bytes per unit of a native read.
    fn char_width(&self) -> usize;
}

/// A large object handle and its release policy.
pub(crate) struct LobSlot<N: OciNative> {
    native: Rc<N>,
    handle: LobHandle,
    width: usize,
    /// Whether this slot frees the handle. Locators fetched from a result set
    /// belong to the native statement.
    owned: bool,
    freed: Cell<bool>,
}

impl<N: OciNative> LobSlot<N> {
    fn new(native: Rc<N>, handle: LobHandle, width: usize, owned: bool) -> Self {
        Self {
            native,
            handle,
            width: width.max(1),
            owned,
            freed: Cell::new(false),
        }
    }

    pub(crate) fn owned(native: Rc<N>, handle: LobHandle, width: usize) -> Self {
        Self::new(native, handle, width, true)
    }

    pub(crate) fn fetched(native: Rc<N>, handle: LobHandle, width: usize) -> Self {
        Self::new(native, handle, width, false)
    }

    pub(crate) fn handle(&self) -> LobHandle {
        self.handle
    }

    /// Frees the handle once. Returns the native result, `true` if there was
    /// nothing to free.
    pub(crate) fn free(&self) -> bool {
        if !self.owned || self.freed.replace(true) {
            return true;
        }
        self.native.lob_free(self.handle)
    }
}

impl<N: OciNative> Drop for LobSlot<N> {
    fn drop(&mut self) {
        if !self.free() {
            log::warn!("Could not free the large object {:?}", self.handle);
        }
    }
}

impl<N: OciNative> LobAccess for LobSlot<N> {
    fn read(&self, count: usize) -> Option<Vec<u8>> {
        self.native.lob_read(self.handle, count)
    }

    fn eof(&self) -> bool {
        self.native.lob_eof(self.handle)
    }

    fn rewind(&self) -> bool {
        self.native.lob_rewind(self.handle)
    }

    fn size(&self) -> Option<u64> {
        self.native.lob_size(self.handle)
    }

    fn tell(&self) -> Option<u64> {
        self.native.lob_tell(self.handle)
    }

    fn char_width(&self) -> usize {
        self.width
    }
}

/// Stream context payload: the borrowed large object.
pub struct LobRef(pub Weak<dyn LobAccess>);

/// Stream wrapper serving [`PROTOCOL`].
#[derive(Default)]
pub struct LobStreamWrapper {
    lob: Option<Weak<dyn LobAccess>>,
}

impl LobStreamWrapper {
    fn factory() -> Box<dyn StreamWrapper> {
        Box::new(LobStreamWrapper::default())
    }

    fn lob(&self) -> io::Result<Rc<dyn LobAccess>> {
        self.lob
            .as_ref()
            .and_then(Weak::upgrade)
            .ok_or_else(|| io::Error::other("The large object was released"))
    }
}

impl StreamWrapper for LobStreamWrapper {
    fn stream_open(&mut self, _path: &str, mode: &str, context: Option<&StreamContext>) -> bool {
        if !matches!(mode, "r" | "rb" | "rt") {
            log::error!("Large object streams are read only, mode `{}` refused", mode);
            return false;
        }
        let Some(payload) = context.and_then(|v| v.option::<LobRef>(PROTOCOL)) else {
            log::error!("The stream context does not carry a large object");
            return false;
        };
        let Some(lob) = payload.0.upgrade() else {
            log::error!("The large object was released before the stream opened");
            return false;
        };
        lob.rewind();
        self.lob = Some(payload.0.clone());
        true
    }

    fn stream_read(&mut self, count: usize) -> io::Result<Vec<u8>> {
        let lob = self.lob()?;
        if count == 0 || lob.eof() {
            return Ok(Vec::new());
        }
        let units = (count / lob.char_width()).max(1);
        lob.read(units)
            .ok_or_else(|| io::Error::other("Could not read the large object"))
    }

    fn stream_eof(&mut self) -> bool {
        self.lob().map(|v| v.eof()).unwrap_or(true)
    }

    fn stream_stat(&mut self) -> io::Result<StreamStat> {
        let size = self
            .lob()?
            .size()
            .ok_or_else(|| io::Error::other("Could not get the large object size"))?;
        Ok(StreamStat { size })
    }

    fn stream_tell(&mut self) -> io::Result<u64> {
        self.lob()?
            .tell()
            .ok_or_else(|| io::Error::other("Could not get the large object position"))
    }
}

static REGISTER: Once = Once::new();

/// Registers the wrapper, once per process.
pub fn register() {
    REGISTER.call_once(|| {
        StreamRegistry::register(PROTOCOL, LobStreamWrapper::factory);
    });
}

/// Opens a readable stream borrowing `lob`.
pub fn open_as_stream(lob: Rc<dyn LobAccess>) -> Result<Stream> {
    register();
    let context = StreamContext::new(PROTOCOL, Rc::new(LobRef(Rc::downgrade(&lob))));
    StreamRegistry::open(&format!("{}://", PROTOCOL), "r", Some(&context))
}

/// Bytes per character of a character large object in `charset`.
pub fn charset_width(charset: &str) -> usize {
    if charset.eq_ignore_ascii_case("AL16UTF16") || charset.eq_ignore_ascii_case("UTF16") {
        2
    } else {
        1
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::RefCell;

    struct Memory {
        data: Vec<u8>,
        position: Cell<usize>,
        width: usize,
        reads: RefCell<Vec<usize>>,
    }

    impl Memory {
        fn new(data: &[u8], width: usize) -> Rc<Memory> {
            Rc::new(Memory {
                data: data.to_vec(),
                position: Cell::new(7),
                width,
                reads: RefCell::new(Vec::new()),
            })
        }
    }

    impl LobAccess for Memory {
        fn read(&self, count: usize) -> Option<Vec<u8>> {
            self.reads.borrow_mut().push(count);
            let start = self.position.get();
            let end = (start + count * self.width).min(self.data.len());
            self.position.set(end);
            Some(self.data[start..end].to_vec())
        }

        fn eof(&self) -> bool {
            self.position.get() >= self.data.len()
        }

        fn rewind(&self) -> bool {
            self.position.set(0);
            true
        }

        fn size(&self) -> Option<u64> {
            Some(self.data.len() as u64)
        }

        fn tell(&self) -> Option<u64> {
            Some(self.position.get() as u64)
        }

        fn char_width(&self) -> usize {
            self.width
        }
    }

    #[test]
    fn reads_from_the_start() {
        let lob = Memory::new(b"long text", 1);
        let stream = open_as_stream(lob.clone()).expect("The wrapper accepts read mode");
        assert_eq!(stream.size().expect("stat"), 9);
        assert_eq!(stream.contents_string().expect("contents"), "long text");
        assert!(stream.eof());
    }

    #[test]
    fn width_policy() {
        let lob = Memory::new(b"a\0b\0c\0", 2);
        let stream = open_as_stream(lob.clone()).expect("The wrapper accepts read mode");
        assert_eq!(stream.read_chunk(4).expect("read"), b"a\0b\0");
        assert_eq!(lob.reads.borrow()[0], 2);
        assert_eq!(stream.read_chunk(1).expect("read"), b"c");
        assert_eq!(lob.reads.borrow()[1], 1);
    }

    #[test]
    fn released() {
        let lob = Memory::new(b"gone", 1);
        let stream = open_as_stream(lob.clone()).expect("The wrapper accepts read mode");
        drop(lob);
        assert!(stream.eof());
        assert!(stream.size().is_err());

        let lob: Rc<dyn LobAccess> = Memory::new(b"gone", 1);
        let weak = Rc::downgrade(&lob);
        drop(lob);
        let context = StreamContext::new(PROTOCOL, Rc::new(LobRef(weak)));
        assert!(StreamRegistry::open("ocipdolob://", "r", Some(&context)).is_err());
    }

    #[test]
    fn modes() {
        register();
        let lob: Rc<dyn LobAccess> = Memory::new(b"x", 1);
        let context = StreamContext::new(PROTOCOL, Rc::new(LobRef(Rc::downgrade(&lob))));
        for mode in ["w", "r+", "a", "rw"] {
            assert!(StreamRegistry::open("ocipdolob://", mode, Some(&context)).is_err());
        }
        for mode in ["r", "rb", "rt"] {
            assert!(StreamRegistry::open("ocipdolob://", mode, Some(&context)).is_ok());
        }
        assert!(StreamRegistry::open("ocipdolob://", "r", None).is_err());
    }

    #[test]
    fn charsets() {
        assert_eq!(charset_width("AL16UTF16"), 2);
        assert_eq!(charset_width("utf16"), 2);
        assert_eq!(charset_width("AL32UTF8"), 1);
        assert_eq!(charset_width("WE8ISO8859P1"), 1);
    }
}
