//! Domain models shared between the server and integration tests

pub mod book;
pub mod cart;
pub mod loyalty;
pub mod order;
pub mod payment;
pub mod promo;
pub mod refund;

pub use book::{Book, BookCreate};
pub use cart::{Cart, CartLine, CartLineInput, PricedCart, PricedLine};
pub use loyalty::{LoyaltyProgram, LoyaltyProgramCreate, UserLoyaltyStatus};
pub use order::{
    Order, OrderItem, OrderPaymentStatus, OrderStatus, OrderStatusHistory, ShippingInfo,
};
pub use payment::{Payment, PaymentStatus};
pub use promo::{DiscountType, PromoCode, PromoCodeCreate, PromoCodeUse};
pub use refund::{Refund, RefundStatus};
