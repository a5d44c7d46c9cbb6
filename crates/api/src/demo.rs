//! In-memory shop used when the server runs standalone.

use common::UserId;
use domain::{Address, CartLine, Money, Product};
use order_flow::InMemoryShippingFeeService;
use store::{InMemoryCartStore, InMemoryOrderStore, InMemoryProductStore, InMemoryUserStore};

/// Shopper with a filled cart and two saved addresses.
pub const DEMO_USER: &str = "demo-user";

/// Handles to the in-memory collaborators behind the demo engine.
#[derive(Clone, Default)]
pub struct DemoShop {
    pub carts: InMemoryCartStore,
    pub products: InMemoryProductStore,
    pub users: InMemoryUserStore,
    pub orders: InMemoryOrderStore,
    pub shipping: InMemoryShippingFeeService,
}

impl DemoShop {
    /// A small catalog plus [`DEMO_USER`]'s cart and addresses.
    pub fn seeded() -> Self {
        let shop = Self::default();

        let catalog = [
            Product::new("SKU-TEE", "Áo thun cotton", Money::from_dong(150_000), 50),
            Product::new("SKU-JEAN", "Quần jean slim", Money::from_dong(420_000), 12)
                .with_package(800, 30, 25, 8),
            Product::new("SKU-CAP", "Mũ lưỡi trai", Money::from_dong(90_000), 2),
        ];
        for product in &catalog {
            shop.products.upsert(product.clone());
        }

        let user = UserId::from(DEMO_USER);
        shop.carts.set_lines(
            &user,
            vec![
                CartLine::from_product(&catalog[0], 2),
                CartLine::from_product(&catalog[1], 1),
            ],
        );
        shop.users.add_address(
            &user,
            Address::new(
                "Nguyễn Văn An",
                "0901234567",
                "45 Lê Lợi",
                "Bến Nghé",
                "Quận 1",
                "Hồ Chí Minh",
            )
            .as_default(),
        );
        shop.users.add_address(
            &user,
            Address::new(
                "Nguyễn Văn An",
                "0901234567",
                "12 Tràng Tiền",
                "Tràng Tiền",
                "Hoàn Kiếm",
                "Hà Nội",
            ),
        );

        shop
    }
}
