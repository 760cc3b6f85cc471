#[cfg(test)]
mod tests {
    use ocibridge_core::{
        AsValue, ClassRegistry, DbError, FetchArg, FetchMode, FetchStyle, FetchTarget, Record,
        Result, Row, Value, db_error, populate,
    };
    use std::{any::Any, cell::RefCell, rc::Rc};

    #[derive(Default)]
    struct Customer {
        id: i64,
        name: String,
        greeting: String,
    }

    impl FetchTarget for Customer {
        fn set_property(&mut self, name: &str, value: Value) -> Result<()> {
            match name {
                "ID" => self.id = i64::try_from_value(value)?,
                "NAME" => self.name = String::try_from_value(value)?,
                _ => {}
            }
            Ok(())
        }

        fn as_any(&self) -> &dyn Any {
            self
        }
    }

    fn classes() -> ClassRegistry {
        let mut classes = ClassRegistry::new();
        classes.register("Customer", |args| {
            let greeting = match args.first() {
                Some(v) => String::try_from_value(v.clone())?,
                None => String::new(),
            };
            Ok(Box::new(Customer {
                greeting,
                ..Default::default()
            }))
        });
        classes
    }

    fn usage(result: Result<FetchMode>) -> bool {
        match result {
            Err(e) => matches!(db_error(&e), Some(DbError::Usage(..))),
            Ok(..) => false,
        }
    }

    #[test]
    fn arity() {
        let classes = classes();
        assert!(usage(FetchMode::from_args(vec![], &classes)));
        assert!(usage(FetchMode::from_args(
            vec![FetchArg::Column(1)],
            &classes
        )));
        assert!(usage(FetchMode::from_args(
            vec![
                FetchArg::Style(FetchStyle::Class),
                FetchArg::Class("Customer".into()),
                FetchArg::Column(3),
            ],
            &classes
        )));
        assert!(usage(FetchMode::from_args(
            vec![
                FetchArg::Style(FetchStyle::Class),
                FetchArg::Class("Customer".into()),
                FetchArg::CtorArgs(vec![]),
                FetchArg::CtorArgs(vec![]),
            ],
            &classes
        )));
        assert!(usage(FetchMode::from_args(
            vec![FetchArg::Style(FetchStyle::Into)],
            &classes
        )));
        assert!(usage(FetchMode::from_args(
            vec![FetchArg::Style(FetchStyle::Num), FetchArg::Column(2)],
            &classes
        )));
    }

    #[test]
    fn modes() {
        let classes = classes();
        let mode = FetchMode::from_args(vec![FetchArg::Style(FetchStyle::Both)], &classes)
            .expect("Both is a plain style");
        assert_eq!(mode.style(), FetchStyle::Both);

        let mode = FetchMode::from_args(
            vec![FetchArg::Style(FetchStyle::Column), FetchArg::Column(2)],
            &classes,
        )
        .expect("Column accepts a column number");
        assert!(matches!(mode, FetchMode::Column(2)));

        let target: Rc<RefCell<dyn FetchTarget>> = Rc::new(RefCell::new(Record::new()));
        let mode = FetchMode::from_args(
            vec![FetchArg::Style(FetchStyle::Into), FetchArg::Object(target)],
            &classes,
        )
        .expect("Into accepts a target");
        assert_eq!(mode.style(), FetchStyle::Into);

        let mode = FetchMode::from_args(
            vec![
                FetchArg::Style(FetchStyle::Class),
                FetchArg::Class("Customer".into()),
                FetchArg::CtorArgs(vec!["hello".into()]),
            ],
            &classes,
        )
        .expect("Customer is registered");
        let FetchMode::Class { class, args } = mode else {
            panic!("Expected a class fetch mode");
        };
        assert_eq!(class.name(), "Customer");
        let instance = class.instantiate(&args).expect("Factory must succeed");
        let customer = instance
            .downcast_ref::<Customer>()
            .expect("The factory builds customers");
        assert_eq!(customer.greeting, "hello");
    }

    #[test]
    fn unsupported() {
        let classes = classes();
        let result = FetchMode::from_args(vec![FetchArg::Style(FetchStyle::KeyPair)], &classes);
        let error = result.err().expect("KeyPair is not supported");
        assert!(matches!(
            db_error(&error),
            Some(DbError::NotImplemented(..))
        ));
        let result = FetchMode::from_args(
            vec![
                FetchArg::Style(FetchStyle::Class),
                FetchArg::Class("Unknown".into()),
            ],
            &classes,
        );
        assert!(usage(result));
    }

    #[test]
    fn populate_instance() {
        let row = Row::new(
            vec!["ID".to_string(), "NAME".to_string()].into(),
            vec![Value::Int64(7), "Ada".into()],
        );
        let mut customer = Customer::default();
        populate(&row, &mut customer).expect("Populate must succeed");
        assert_eq!(customer.id, 7);
        assert_eq!(customer.name, "Ada");

        let record = Record::from(row);
        assert_eq!(record.get("NAME"), Some(&Value::Varchar("Ada".into())));
        assert_eq!(record.len(), 2);
    }
}
