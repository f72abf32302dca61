//! Shopping cart walkthrough.
//!
//! Wires the configured store and bus, subscribes to cart events, saves a
//! cart twice and shows a stale writer being rejected.
//!
//! Run with `KOMANDANTE_LOG=debug` to see the load/save/publish spans.

use std::sync::Arc;

use komandante::bus::{init_event_bus, BusError, ErrorCallback, HandlerResult};
use komandante::storage::init_event_store;
use komandante::utils::bootstrap::init_tracing;
use komandante::{
    Aggregate, AggregateBase, AggregateFactory, AggregateHandler, AggregateId, Config, Event,
    EventBusExt, EventClass, EventTag, StoreError,
};
use tracing::{info, warn};

#[derive(Debug, Clone)]
enum CartEvent {
    ItemAdded { cart_id: AggregateId, item: String, cents: u64 },
    ItemRemoved { cart_id: AggregateId, item: String },
}

#[derive(Debug, Clone)]
struct CheckedOut {
    cart_id: AggregateId,
}

#[derive(Debug, Clone)]
enum ShopEvent {
    Cart(CartEvent),
    CheckedOut(CheckedOut),
}

impl Event for ShopEvent {
    fn aggregate_id(&self) -> AggregateId {
        match self {
            ShopEvent::Cart(
                CartEvent::ItemAdded { cart_id, .. } | CartEvent::ItemRemoved { cart_id, .. },
            ) => *cart_id,
            ShopEvent::CheckedOut(checked_out) => checked_out.cart_id,
        }
    }

    fn event_type(&self) -> EventTag {
        match self {
            ShopEvent::Cart(CartEvent::ItemAdded { .. }) => "ItemAdded",
            ShopEvent::Cart(CartEvent::ItemRemoved { .. }) => "ItemRemoved",
            ShopEvent::CheckedOut(_) => "CheckedOut",
        }
    }

    fn categories(&self) -> &'static [EventTag] {
        match self {
            ShopEvent::Cart(_) => &["CartEvent"],
            ShopEvent::CheckedOut(_) => &[],
        }
    }
}

impl EventClass<ShopEvent> for CartEvent {
    const TAG: EventTag = "CartEvent";

    fn narrow(event: &ShopEvent) -> Option<Self> {
        match event {
            ShopEvent::Cart(cart) => Some(cart.clone()),
            ShopEvent::CheckedOut(_) => None,
        }
    }
}

impl EventClass<ShopEvent> for CheckedOut {
    const TAG: EventTag = "CheckedOut";

    fn narrow(event: &ShopEvent) -> Option<Self> {
        match event {
            ShopEvent::CheckedOut(checked_out) => Some(checked_out.clone()),
            ShopEvent::Cart(_) => None,
        }
    }
}

struct Cart {
    base: AggregateBase<ShopEvent>,
    items: Vec<(String, u64)>,
    checked_out: bool,
}

impl Cart {
    fn add(&mut self, item: &str, cents: u64) {
        let cart_id = self.id();
        self.record(ShopEvent::Cart(CartEvent::ItemAdded {
            cart_id,
            item: item.to_string(),
            cents,
        }));
    }

    fn remove(&mut self, item: &str) {
        let cart_id = self.id();
        self.record(ShopEvent::Cart(CartEvent::ItemRemoved {
            cart_id,
            item: item.to_string(),
        }));
    }

    fn check_out(&mut self) {
        let cart_id = self.id();
        self.record(ShopEvent::CheckedOut(CheckedOut { cart_id }));
    }

    fn total(&self) -> u64 {
        self.items.iter().map(|(_, cents)| cents).sum()
    }
}

impl Aggregate for Cart {
    type Event = ShopEvent;

    fn base(&self) -> &AggregateBase<ShopEvent> {
        &self.base
    }

    fn base_mut(&mut self) -> &mut AggregateBase<ShopEvent> {
        &mut self.base
    }

    fn apply(&mut self, event: &ShopEvent) {
        match event {
            ShopEvent::Cart(CartEvent::ItemAdded { item, cents, .. }) => {
                self.items.push((item.clone(), *cents));
            }
            ShopEvent::Cart(CartEvent::ItemRemoved { item, .. }) => {
                if let Some(pos) = self.items.iter().position(|(name, _)| name == item) {
                    self.items.remove(pos);
                }
            }
            ShopEvent::CheckedOut(_) => self.checked_out = true,
        }
    }
}

struct CartFactory;

impl AggregateFactory for CartFactory {
    type Aggregate = Cart;

    fn create(&self, id: AggregateId) -> Cart {
        Cart {
            base: AggregateBase::new(id),
            items: Vec::new(),
            checked_out: false,
        }
    }
}

fn audit(event: &ShopEvent) -> HandlerResult {
    info!(event_type = event.event_type(), aggregate_id = %event.aggregate_id(), "audit");
    Ok(())
}

fn reserve_stock(event: CartEvent) -> HandlerResult {
    match event {
        CartEvent::ItemAdded { item, .. } if item == "unobtainium" => {
            Err(format!("no stock for {item}").into())
        }
        CartEvent::ItemAdded { item, .. } => {
            info!(%item, "stock reserved");
            Ok(())
        }
        CartEvent::ItemRemoved { item, .. } => {
            info!(%item, "stock released");
            Ok(())
        }
    }
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    init_tracing();
    let config = Config::load(None)?;

    let store = init_event_store::<ShopEvent>(&config.storage);
    let bus = init_event_bus::<ShopEvent>(&config.messaging);

    bus.subscribe(audit, None).await?;
    let on_reserve_error: ErrorCallback =
        Box::new(|e: &BusError| warn!(error = %e, "reservation failed"));
    bus.subscribe_of::<CartEvent, _>(reserve_stock, Some(on_reserve_error))
        .await?;
    bus.subscribe_of::<CheckedOut, _>(
        |checked_out| {
            info!(cart_id = %checked_out.cart_id, "sending receipt");
            Ok(())
        },
        None,
    )
    .await?;

    let handler = AggregateHandler::<CartFactory>::new(store, Arc::clone(&bus), CartFactory);
    let cart_id = AggregateId::new();

    let mut cart = handler.load(cart_id).await?;
    cart.add("teapot", 2_500);
    cart.add("unobtainium", 99_999);
    cart.add("cups", 1_200);
    handler.save(&mut cart).await?;

    let mut cart = handler.load(cart_id).await?;
    let mut stale = handler.load(cart_id).await?;
    cart.remove("unobtainium");
    cart.check_out();
    handler.save(&mut cart).await?;
    info!(
        version = cart.version(),
        total_cents = cart.total(),
        checked_out = cart.checked_out,
        "cart saved"
    );

    stale.add("saucer", 800);
    match handler.save(&mut stale).await {
        Err(StoreError::Concurrency {
            expected, actual, ..
        }) => info!(
            expected,
            actual,
            pending = stale.events().len(),
            "stale cart rejected"
        ),
        Err(e) => return Err(e.into()),
        Ok(()) => warn!("stale cart unexpectedly saved"),
    }

    let cart = handler.load(cart_id).await?;
    info!(
        version = cart.version(),
        items = cart.items.len(),
        total_cents = cart.total(),
        "cart reloaded"
    );
    Ok(())
}
