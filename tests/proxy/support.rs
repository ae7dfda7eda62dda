//! Test domain: a service exercising every parameter and result shape, and a
//! connection child service handed out by `createConnection`.

use std::collections::{HashMap, HashSet};
use std::sync::{Arc, Mutex};
use std::thread;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use service_proxy::bus::InMemoryBus;
use service_proxy::proxy::{self, CallArgs, Interface, ProxyClient, Reply, ServiceHandle};
use service_proxy::wire::WireObject;

pub const ADDRESS: &str = "someaddress";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SomeEnum {
    Wibble,
    Wobble,
}

service_proxy::wire_enum!(SomeEnum { Wibble, Wobble });

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TestDataObject {
    pub string: String,
    pub number: i32,
    pub flag: bool,
}

service_proxy::data_object!(serde TestDataObject);

/// Shared record of what the services were called with.
#[derive(Default)]
pub struct CallLog {
    calls: Mutex<Vec<String>>,
}

impl CallLog {
    pub fn record(&self, call: impl Into<String>) {
        self.calls.lock().unwrap().push(call.into());
    }

    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }
}

pub struct TestService {
    pub log: Arc<CallLog>,
}

pub struct TestConnection {
    pub id: String,
    pub log: Arc<CallLog>,
}

impl TestService {
    pub fn no_params(&self) {
        self.log.record("noParams");
    }

    #[allow(clippy::too_many_arguments)]
    pub fn basic_types(
        &self,
        str: String,
        b: i8,
        s: i16,
        i: i32,
        l: i64,
        f: f32,
        d: f64,
        c: char,
        flag: bool,
    ) {
        self.log.record(format!(
            "basicTypes({},{},{},{},{},{},{},{},{})",
            str, b, s, i, l, f, d, c, flag
        ));
    }

    pub fn create_connection(&self, id: String) -> Arc<TestConnection> {
        self.log.record(format!("createConnection({})", id));
        Arc::new(TestConnection {
            id,
            log: Arc::clone(&self.log),
        })
    }
}

impl TestConnection {
    pub fn close(&self) {
        self.log.record(format!("close({})", self.id));
    }
}

pub fn connection_interface() -> Arc<Interface<TestConnection>> {
    Interface::<TestConnection>::builder("TestConnection")
        .action("startTransaction")
        .returns(|conn, _, reply: Reply<String>| {
            conn.log.record("startTransaction");
            reply.succeed(format!("tx-{}", conn.id));
            Ok(())
        })
        .action("insert")
        .param::<String>("name")
        .param::<WireObject>("data")
        .fluent(|conn, args| {
            let name: String = args.get("name")?;
            let data: WireObject = args.get("data")?;
            conn.log.record(format!("insert({},{})", name, data.len()));
            Ok(())
        })
        .action("close")
        .closes()
        .fluent(|conn, _| {
            conn.close();
            Ok(())
        })
        .build()
        .unwrap()
}

pub fn test_interface() -> Arc<Interface<TestService>> {
    Interface::<TestService>::builder("TestService")
        .action("noParams")
        .fluent(|svc, _| {
            svc.no_params();
            Ok(())
        })
        .action("basicTypes")
        .param::<String>("str")
        .param::<i8>("b")
        .param::<i16>("s")
        .param::<i32>("i")
        .param::<i64>("l")
        .param::<f32>("f")
        .param::<f64>("d")
        .param::<char>("c")
        .param::<bool>("bool")
        .fluent(|svc, args| {
            svc.basic_types(
                args.get("str")?,
                args.get("b")?,
                args.get("s")?,
                args.get("i")?,
                args.get("l")?,
                args.get("f")?,
                args.get("d")?,
                args.get("c")?,
                args.get("bool")?,
            );
            Ok(())
        })
        .action("basicBoxedTypes")
        .param::<Option<String>>("str")
        .param::<Option<i32>>("i")
        .param::<Option<char>>("c")
        .fluent(|svc, args| {
            let str: Option<String> = args.get("str")?;
            let i: Option<i32> = args.get("i")?;
            let c: Option<char> = args.get("c")?;
            svc.log
                .record(format!("basicBoxedTypes({:?},{:?},{:?})", str, i, c));
            Ok(())
        })
        .action("enumType")
        .param::<SomeEnum>("someEnum")
        .fluent(|svc, args| {
            let value: SomeEnum = args.get("someEnum")?;
            svc.log.record(format!("enumType({:?})", value));
            Ok(())
        })
        .action("dataObjectType")
        .param::<TestDataObject>("options")
        .fluent(|svc, args| {
            let options: TestDataObject = args.get("options")?;
            svc.log.record(format!(
                "dataObjectType({},{},{})",
                options.string, options.number, options.flag
            ));
            Ok(())
        })
        .action("listParams")
        .param::<Vec<String>>("listString")
        .param::<Vec<char>>("listChar")
        .fluent(|svc, args| {
            let strings: Vec<String> = args.get("listString")?;
            let chars: Vec<char> = args.get("listChar")?;
            svc.log
                .record(format!("listParams({:?},{:?})", strings, chars));
            Ok(())
        })
        .action("mapParams")
        .param::<HashMap<String, i64>>("mapLong")
        .fluent(|svc, args| {
            let map: HashMap<String, i64> = args.get("mapLong")?;
            let mut entries: Vec<_> = map.into_iter().collect();
            entries.sort();
            svc.log.record(format!("mapParams({:?})", entries));
            Ok(())
        })
        .action("stringHandler")
        .returns(|_, _, reply: Reply<String>| {
            reply.succeed("foobar".to_string());
            Ok(())
        })
        .action("charHandler")
        .returns(|_, _, reply: Reply<char>| {
            reply.succeed('X');
            Ok(())
        })
        .action("voidHandler")
        .returns(|_, _, reply: Reply<()>| {
            reply.succeed(());
            Ok(())
        })
        .action("enumHandler")
        .returns(|_, _, reply: Reply<SomeEnum>| {
            reply.succeed(SomeEnum::Wobble);
            Ok(())
        })
        .action("dataObjectHandler")
        .returns(|_, _, reply: Reply<TestDataObject>| {
            reply.succeed(TestDataObject {
                string: "foo".into(),
                number: 123,
                flag: true,
            });
            Ok(())
        })
        .action("jsonObjectHandler")
        .returns(|_, _, reply: Reply<WireObject>| {
            let mut object = WireObject::new();
            object.insert("blah".into(), "wibble".into());
            reply.succeed(object);
            Ok(())
        })
        .action("listStringHandler")
        .returns(|_, _, reply: Reply<Vec<String>>| {
            reply.succeed(vec!["foo".into(), "bar".into(), "wibble".into()]);
            Ok(())
        })
        .action("listCharHandler")
        .returns(|_, _, reply: Reply<Vec<char>>| {
            reply.succeed(vec!['X', 'Y', 'Z']);
            Ok(())
        })
        .action("setStringHandler")
        .returns(|_, _, reply: Reply<HashSet<String>>| {
            let set: HashSet<String> = ["b", "a", "a"].iter().map(|s| s.to_string()).collect();
            reply.succeed(set);
            Ok(())
        })
        .action("delayedHandler")
        .param::<String>("str")
        .returns(|_, args, reply: Reply<String>| {
            let str: String = args.get("str")?;
            thread::spawn(move || {
                thread::sleep(Duration::from_millis(20));
                reply.succeed(str.to_uppercase());
            });
            Ok(())
        })
        .action("failingMethod")
        .returns(|_, _, reply: Reply<String>| {
            reply.fail("wibble");
            Ok(())
        })
        .action("forgetfulHandler")
        .returns(|_, _, reply: Reply<String>| {
            drop(reply);
            Ok(())
        })
        .action("fluentMethod")
        .param::<String>("str")
        .fluent(|svc, args| {
            let str: String = args.get("str")?;
            svc.log.record(format!("fluentMethod({})", str));
            Ok(())
        })
        .action("createConnection")
        .param::<String>("str")
        .returns_proxy(connection_interface(), |svc, args, reply| {
            let id: String = args.get("str")?;
            reply.succeed(svc.create_connection(id));
            Ok(())
        })
        .build()
        .unwrap()
}

/// Typed client for [`TestConnection`] proxies.
pub struct ConnectionProxy {
    client: ProxyClient,
}

impl From<ProxyClient> for ConnectionProxy {
    fn from(client: ProxyClient) -> Self {
        Self { client }
    }
}

impl ConnectionProxy {
    pub fn address(&self) -> &str {
        self.client.address()
    }

    pub fn start_transaction(&self) -> Result<String, service_proxy::CallError> {
        self.client.call("startTransaction", CallArgs::new())
    }

    pub fn close(&self) -> Result<(), service_proxy::CallError> {
        self.client.send("close", CallArgs::new())
    }
}

pub struct Fixture {
    pub bus: Arc<InMemoryBus>,
    pub log: Arc<CallLog>,
    pub handle: ServiceHandle,
    pub client: ProxyClient,
}

/// Expose a fresh [`TestService`] at [`ADDRESS`] on a fresh bus.
pub fn fixture() -> Fixture {
    let bus = Arc::new(InMemoryBus::recording());
    let log = Arc::new(CallLog::default());
    let service = Arc::new(TestService {
        log: Arc::clone(&log),
    });
    let handle = proxy::register_service(bus.clone(), test_interface(), service, ADDRESS).unwrap();
    let client = proxy::create_proxy(bus.clone(), ADDRESS);
    Fixture {
        bus,
        log,
        handle,
        client,
    }
}
