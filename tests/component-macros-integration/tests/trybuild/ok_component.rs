use component_macros::{injectable, Component};
use di_abstractions::{Autowired, Component as _, ErasedConstructor};
use std::sync::Arc;

pub trait Greeter: Send + Sync {
    fn greet(&self) -> String;
}

#[derive(Component, Default)]
#[component(provides(dyn Greeter))]
struct English;

impl Greeter for English {
    fn greet(&self) -> String {
        "hello".to_string()
    }
}

#[derive(Component)]
#[component(injectable)]
struct Host {
    greeter: Arc<dyn Greeter>,
    #[autowired(qualifier = "english")]
    backup: Autowired<dyn Greeter>,
}

#[injectable]
impl Host {
    #[autowired]
    fn new(#[qualifier("english")] greeter: Arc<dyn Greeter>) -> Self {
        Self {
            greeter,
            backup: Autowired::new(),
        }
    }

    #[allow(dead_code)]
    fn greet(&self) -> String {
        self.greeter.greet()
    }
}

fn main() {
    let english = English::descriptor();
    assert_eq!(english.capabilities.len(), 1);

    let host = Host::descriptor();
    assert_eq!(host.fields.len(), 1);
    assert_eq!(host.fields[0].point.qualifier(), Some("english"));
    assert!(matches!(
        host.constructor,
        ErasedConstructor::Injected { ref params, .. } if params.len() == 1
    ));
}
