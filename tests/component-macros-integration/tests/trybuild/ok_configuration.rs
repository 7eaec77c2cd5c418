use component_macros::{injectable, Configuration};
use di_abstractions::{Autowired, Configuration as _};
use std::sync::Arc;

#[derive(Debug, Default)]
struct Settings {
    retries: u32,
}

#[derive(Debug)]
struct Client {
    retries: u32,
}

#[derive(Configuration, Default)]
struct ClientConfiguration {
    #[autowired]
    settings: Autowired<Settings>,
}

#[injectable]
impl ClientConfiguration {
    #[bean(name = "mainClient")]
    fn client(&self) -> Result<Client, String> {
        let settings = self.settings.get().ok_or("settings missing")?;
        Ok(Client {
            retries: settings.retries,
        })
    }

    #[bean]
    fn shared(&self) -> Arc<Settings> {
        Arc::new(Settings::default())
    }
}

fn main() {
    let declaration = ClientConfiguration::declaration();
    assert_eq!(declaration.fields.len(), 1);
    assert_eq!(declaration.beans.len(), 2);
    assert_eq!(declaration.beans[0].instance_name(), "mainClient");
    let _ = Client { retries: 0 }.retries;
}
