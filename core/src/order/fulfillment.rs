// core/src/order/fulfillment.rs

//! How a `ready` order reaches its customer. The choice is recorded only in the
//! view; the stored status stays `ready`.

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CourierService {
  Bolt,
  Uber,
}

impl CourierService {
  /// Deep link that opens the courier app.
  pub fn deep_link(self) -> &'static str {
    match self {
      CourierService::Bolt => "https://m.bolt.eu/",
      CourierService::Uber => "https://m.uber.com/ul/",
    }
  }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FulfillmentRoute {
  OwnDelivery,
  Courier(CourierService),
  CustomerPickup,
}

impl FulfillmentRoute {
  pub fn label(self) -> &'static str {
    match self {
      FulfillmentRoute::OwnDelivery => "Own Delivery",
      FulfillmentRoute::Courier(_) => "Bolt/Uber",
      FulfillmentRoute::CustomerPickup => "Customer Pick-up",
    }
  }

  /// The external app to open for this route, if any.
  pub fn handoff_link(self) -> Option<&'static str> {
    match self {
      FulfillmentRoute::Courier(service) => Some(service.deep_link()),
      FulfillmentRoute::OwnDelivery | FulfillmentRoute::CustomerPickup => None,
    }
  }
}
