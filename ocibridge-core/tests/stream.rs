#[cfg(test)]
mod tests {
    use ocibridge_core::{
        DbError, Stream, StreamContext, StreamRegistry, StreamStat, StreamWrapper, db_error,
    };
    use std::{io, rc::Rc};

    /// Serves the context payload, always answering with twice the bytes requested.
    #[derive(Default)]
    struct Greedy {
        data: Vec<u8>,
        position: usize,
    }

    impl StreamWrapper for Greedy {
        fn stream_open(
            &mut self,
            _path: &str,
            mode: &str,
            context: Option<&StreamContext>,
        ) -> bool {
            if mode != "r" {
                return false;
            }
            let Some(data) = context.and_then(|c| c.option::<Vec<u8>>("greedy")) else {
                return false;
            };
            self.data = (*data).clone();
            true
        }

        fn stream_read(&mut self, count: usize) -> io::Result<Vec<u8>> {
            let end = (self.position + count * 2).min(self.data.len());
            let result = self.data[self.position..end].to_vec();
            self.position = end;
            Ok(result)
        }

        fn stream_eof(&mut self) -> bool {
            self.position >= self.data.len()
        }

        fn stream_stat(&mut self) -> io::Result<StreamStat> {
            Ok(StreamStat {
                size: self.data.len() as u64,
            })
        }

        fn stream_tell(&mut self) -> io::Result<u64> {
            Ok(self.position as u64)
        }
    }

    fn greedy() -> Box<dyn StreamWrapper> {
        Box::new(Greedy::default())
    }

    fn register() {
        StreamRegistry::register("greedy", greedy);
    }

    #[test]
    fn register_once() {
        register();
        assert!(StreamRegistry::is_registered("greedy"));
        assert!(!StreamRegistry::register("greedy", greedy));
        assert!(!StreamRegistry::is_registered("missing"));
    }

    #[test]
    fn surplus_is_buffered() {
        register();
        let context = StreamContext::new("greedy", Rc::new(b"0123456789".to_vec()));
        let stream = StreamRegistry::open("greedy://", "r", Some(&context))
            .expect("The greedy wrapper accepts read mode");
        assert_eq!(stream.size().expect("stat"), 10);
        assert_eq!(stream.read_chunk(3).expect("read"), b"012");
        assert_eq!(stream.read_chunk(3).expect("read"), b"345");
        assert!(!stream.eof());
        assert_eq!(stream.contents_string().expect("contents"), "6789");
        assert!(stream.eof());
        assert_eq!(stream.read_chunk(4).expect("read"), b"");
    }

    #[test]
    fn open_failures() {
        register();
        let context = StreamContext::new("greedy", Rc::new(b"x".to_vec()));
        assert!(StreamRegistry::open("greedy://", "w", Some(&context)).is_err());
        assert!(StreamRegistry::open("greedy://", "r", None).is_err());
        let error = StreamRegistry::open("nowhere://", "r", None)
            .err()
            .expect("Unknown protocol");
        assert!(matches!(db_error(&error), Some(DbError::Usage(..))));
        let error = StreamRegistry::open("no protocol", "r", None)
            .err()
            .expect("Missing protocol");
        assert!(matches!(db_error(&error), Some(DbError::Usage(..))));
    }

    #[test]
    fn memory() {
        let stream = Stream::from_text("long text");
        let other = stream.clone();
        assert!(stream.same_stream(&other));
        assert!(!stream.same_stream(&Stream::from_text("long text")));
        assert_eq!(other.read_chunk(5).expect("read"), b"long ");
        assert_eq!(stream.tell().expect("tell"), 5);
        assert_eq!(stream.contents_string().expect("contents"), "text");
        assert!(other.eof());
    }
}
