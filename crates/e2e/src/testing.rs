//! In-process storefront double
//!
//! [`FakeStorefront`] implements [`Driver`] over a small model of the
//! storefront: it renders each page as a flat list of nodes carrying
//! `data-test` ids, roles and text, and interprets [`Locator`] descriptors
//! against that list. Behaviour follows the public storefront closely enough
//! for the screen types to run unchanged, including the persona defects.

use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

use async_trait::async_trait;
use parking_lot::Mutex;
use storefront_common::catalog::{
    BAD_CREDENTIALS_MESSAGE, FIRST_NAME_REQUIRED_MESSAGE, LAST_NAME_REQUIRED_MESSAGE,
    LOCKED_OUT_MESSAGE, ORDER_CONFIRMATION_MESSAGE, PASSWORD_REQUIRED_MESSAGE,
    POSTAL_CODE_REQUIRED_MESSAGE, USERNAME_REQUIRED_MESSAGE,
};
use storefront_common::persona::{BROKEN_IMAGE_SOURCE, SHARED_SECRET};
use storefront_common::{
    MoneyAmount, Persona, ProductKey, ScreenState, SortOrder, DEFAULT_BASE_URL,
};

use crate::driver::{Driver, DriverError, DriverFactory, DriverResult};
use crate::locator::{Locator, Role};

/// Knobs for the fake storefront
#[derive(Debug, Clone)]
pub struct FakeConfig {
    pub base_url: String,
    /// How long navigation and cart updates take to land for the degraded-performance persona
    pub glitch_delay: Duration,
    /// Added to the rendered order total, to simulate a pricing defect
    pub total_skew_cents: i64,
    /// How long opening a session takes, to simulate a browser that fails to launch
    pub open_delay: Duration,
    /// How long closing a session takes, to simulate a hung driver
    pub close_delay: Duration,
}

impl Default for FakeConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            glitch_delay: Duration::from_millis(150),
            total_skew_cents: 0,
            open_delay: Duration::ZERO,
            close_delay: Duration::ZERO,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Tag {
    Div,
    Span,
    Button,
    Link,
    Input,
    Select,
    Img,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Field {
    Username,
    Password,
    FirstName,
    LastName,
    PostalCode,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Action {
    Input(Field),
    Login,
    Sort,
    AddToCart(ProductKey),
    Remove(ProductKey),
    OpenCart,
    ContinueShopping,
    Checkout,
    Continue,
    Finish,
    BackHome,
}

#[derive(Debug, Clone)]
struct Node {
    tag: Tag,
    test_id: Option<String>,
    text: String,
    attrs: Vec<(&'static str, String)>,
    parent: Option<usize>,
    action: Option<Action>,
}

/// Pre-order node list for one rendered page
#[derive(Default)]
struct Page {
    nodes: Vec<Node>,
}

impl Page {
    fn push(&mut self, parent: Option<usize>, tag: Tag, test_id: &str, text: impl Into<String>) -> usize {
        self.nodes.push(Node {
            tag,
            test_id: (!test_id.is_empty()).then(|| test_id.to_string()),
            text: text.into(),
            attrs: Vec::new(),
            parent,
            action: None,
        });
        self.nodes.len() - 1
    }

    fn with_action(&mut self, index: usize, action: Action) -> usize {
        self.nodes[index].action = Some(action);
        index
    }

    fn with_attr(&mut self, index: usize, name: &'static str, value: impl Into<String>) -> usize {
        self.nodes[index].attrs.push((name, value.into()));
        index
    }

    fn is_ancestor(&self, ancestor: usize, mut node: usize) -> bool {
        while let Some(parent) = self.nodes[node].parent {
            if parent == ancestor {
                return true;
            }
            node = parent;
        }
        false
    }

    /// Own text followed by the text of every descendant, whitespace-normalized
    fn full_text(&self, index: usize) -> String {
        let mut parts = vec![self.nodes[index].text.as_str()];
        for (i, node) in self.nodes.iter().enumerate().skip(index + 1) {
            if self.is_ancestor(index, i) {
                parts.push(node.text.as_str());
            }
        }
        parts
            .iter()
            .flat_map(|p| p.split_whitespace())
            .collect::<Vec<_>>()
            .join(" ")
    }

    fn matches(&self, index: usize, locator: &Locator) -> bool {
        let node = &self.nodes[index];
        let test_id = node.test_id.as_deref();
        match locator {
            Locator::TestId(id) => test_id == Some(id.as_str()),
            Locator::TestIdPrefix(prefix) => test_id.is_some_and(|t| t.starts_with(prefix.as_str())),
            Locator::TestIdSuffix(suffix) => test_id.is_some_and(|t| t.ends_with(suffix.as_str())),
            Locator::Role { role, name } => {
                let tag = match role {
                    Role::Button => Tag::Button,
                    Role::Link => Tag::Link,
                };
                node.tag == tag && self.full_text(index) == *name
            }
            Locator::Containing { base, text } => {
                self.matches(index, base) && self.full_text(index).contains(text.as_str())
            }
            Locator::Within { scope, target } => {
                self.matches(index, target)
                    && (0..index).any(|a| self.is_ancestor(a, index) && self.matches(a, scope))
            }
        }
    }

    fn find(&self, locator: &Locator) -> Vec<usize> {
        (0..self.nodes.len())
            .filter(|i| self.matches(*i, locator))
            .collect()
    }
}

enum Effect {
    Navigate(&'static str),
    AddToCart(ProductKey),
}

struct Pending {
    due: Instant,
    effect: Effect,
}

struct Shop {
    path: String,
    user: Option<Persona>,
    username: String,
    password: String,
    login_error: Option<String>,
    sort: SortOrder,
    cart: Vec<ProductKey>,
    first_name: String,
    last_name: String,
    postal_code: String,
    checkout_error: Option<String>,
    pending: Vec<Pending>,
}

impl Shop {
    fn new() -> Self {
        Self {
            path: ScreenState::Login.path().to_string(),
            user: None,
            username: String::new(),
            password: String::new(),
            login_error: None,
            sort: SortOrder::default(),
            cart: Vec::new(),
            first_name: String::new(),
            last_name: String::new(),
            postal_code: String::new(),
            checkout_error: None,
            pending: Vec::new(),
        }
    }

    fn settle(&mut self) {
        let now = Instant::now();
        let (due, waiting): (Vec<_>, Vec<_>) =
            self.pending.drain(..).partition(|p| p.due <= now);
        self.pending = waiting;
        for pending in due {
            self.apply(pending.effect);
        }
    }

    fn apply(&mut self, effect: Effect) {
        match effect {
            Effect::Navigate(path) => self.path = path.to_string(),
            Effect::AddToCart(product) => {
                if !self.cart.contains(&product) {
                    self.cart.push(product);
                }
            }
        }
    }

    fn schedule(&mut self, effect: Effect, delay: Duration) {
        if self.user == Some(Persona::DegradedPerformance) && !delay.is_zero() {
            self.pending.push(Pending {
                due: Instant::now() + delay,
                effect,
            });
        } else {
            self.apply(effect);
        }
    }

    fn screen(&self) -> Option<ScreenState> {
        ScreenState::from_url(&self.path)
    }

    fn listed_products(&self) -> Vec<ProductKey> {
        let mut products = ProductKey::ALL.to_vec();
        match self.sort {
            SortOrder::NameAscending => products.sort_by_key(|p| p.display_name()),
            SortOrder::NameDescending => {
                products.sort_by_key(|p| p.display_name());
                products.reverse();
            }
            SortOrder::PriceAscending => products.sort_by_key(|p| p.list_price()),
            SortOrder::PriceDescending => {
                products.sort_by_key(|p| std::cmp::Reverse(p.list_price()))
            }
        }
        products
    }

    fn subtotal(&self) -> MoneyAmount {
        self.cart.iter().map(|p| p.list_price()).sum()
    }

    fn tax(&self) -> MoneyAmount {
        MoneyAmount::from_cents((self.subtotal().cents() * 8 + 50) / 100)
    }

    fn image_source(&self, base_url: &str, product: ProductKey) -> String {
        if self.user.is_some_and(|u| u.has_image_defect()) {
            format!("{}{}", base_url, BROKEN_IMAGE_SOURCE)
        } else {
            format!("{}/static/media/{}.jpg", base_url, product.slug())
        }
    }

    fn render(&self, config: &FakeConfig) -> Page {
        let mut page = Page::default();
        let screen = match self.screen() {
            Some(screen) => screen,
            None => {
                page.push(None, Tag::Div, "", "404 Not Found");
                return page;
            }
        };

        if screen == ScreenState::Login {
            let form = page.push(None, Tag::Div, "login-container", "");
            let user = page.push(Some(form), Tag::Input, "username", "");
            page.with_action(user, Action::Input(Field::Username));
            page.with_attr(user, "value", self.username.clone());
            let pass = page.push(Some(form), Tag::Input, "password", "");
            page.with_action(pass, Action::Input(Field::Password));
            page.with_attr(pass, "value", self.password.clone());
            if let Some(error) = &self.login_error {
                page.push(Some(form), Tag::Span, "error", error.clone());
            }
            let login = page.push(Some(form), Tag::Button, "login-button", "Login");
            page.with_action(login, Action::Login);
            return page;
        }

        let header = page.push(None, Tag::Div, "primary-header", "");
        let link = page.push(Some(header), Tag::Link, "shopping-cart-link", "");
        page.with_action(link, Action::OpenCart);
        if !self.cart.is_empty() {
            page.push(Some(link), Tag::Span, "shopping-cart-badge", self.cart.len().to_string());
        }
        if let Some(title) = screen.title() {
            page.push(Some(header), Tag::Span, "title", title);
        }

        match screen {
            ScreenState::Login => {}
            ScreenState::Listing => {
                let select = page.push(Some(header), Tag::Select, "product-sort-container", "");
                page.with_action(select, Action::Sort);
                page.with_attr(select, "value", self.sort.option_value());
                page.push(Some(header), Tag::Span, "active-option", self.sort.label());

                let container = page.push(None, Tag::Div, "inventory-container", "");
                for product in self.listed_products() {
                    let item = page.push(Some(container), Tag::Div, "inventory-item", "");
                    let img = page.push(
                        Some(item),
                        Tag::Img,
                        &format!("inventory-item-{}-img", product.slug()),
                        "",
                    );
                    page.with_attr(img, "src", self.image_source(&config.base_url, product));
                    page.push(Some(item), Tag::Div, "inventory-item-name", product.display_name());
                    page.push(Some(item), Tag::Div, "inventory-item-price", product.list_price().to_string());
                    if self.cart.contains(&product) {
                        let button = page.push(
                            Some(item),
                            Tag::Button,
                            &format!("remove-{}", product.slug()),
                            "Remove",
                        );
                        page.with_action(button, Action::Remove(product));
                    } else {
                        let button = page.push(
                            Some(item),
                            Tag::Button,
                            &format!("add-to-cart-{}", product.slug()),
                            "Add to cart",
                        );
                        page.with_action(button, Action::AddToCart(product));
                    }
                }
            }
            ScreenState::Cart => {
                let list = page.push(None, Tag::Div, "cart-list", "");
                for product in &self.cart {
                    let item = page.push(Some(list), Tag::Div, "inventory-item", "");
                    page.push(Some(item), Tag::Div, "item-quantity", "1");
                    page.push(Some(item), Tag::Div, "inventory-item-name", product.display_name());
                    page.push(Some(item), Tag::Div, "inventory-item-price", product.list_price().to_string());
                    let remove = page.push(
                        Some(item),
                        Tag::Button,
                        &format!("remove-{}", product.slug()),
                        "Remove",
                    );
                    page.with_action(remove, Action::Remove(*product));
                }
                let back = page.push(None, Tag::Button, "continue-shopping", "Continue Shopping");
                page.with_action(back, Action::ContinueShopping);
                let checkout = page.push(None, Tag::Button, "checkout", "Checkout");
                page.with_action(checkout, Action::Checkout);
            }
            ScreenState::CheckoutInfo => {
                let form = page.push(None, Tag::Div, "checkout-info-container", "");
                for (id, field, value) in [
                    ("firstName", Field::FirstName, &self.first_name),
                    ("lastName", Field::LastName, &self.last_name),
                    ("postalCode", Field::PostalCode, &self.postal_code),
                ] {
                    let input = page.push(Some(form), Tag::Input, id, "");
                    page.with_action(input, Action::Input(field));
                    page.with_attr(input, "value", value.clone());
                }
                if let Some(error) = &self.checkout_error {
                    page.push(Some(form), Tag::Span, "error", error.clone());
                }
                let next = page.push(Some(form), Tag::Button, "continue", "Continue");
                page.with_action(next, Action::Continue);
            }
            ScreenState::CheckoutOverview => {
                let list = page.push(None, Tag::Div, "cart-list", "");
                for product in &self.cart {
                    let item = page.push(Some(list), Tag::Div, "inventory-item", "");
                    page.push(Some(item), Tag::Div, "inventory-item-name", product.display_name());
                    page.push(Some(item), Tag::Div, "inventory-item-price", product.list_price().to_string());
                }
                let subtotal = self.subtotal();
                let tax = self.tax();
                let total = MoneyAmount::from_cents(
                    subtotal.cents() + tax.cents() + config.total_skew_cents,
                );
                page.push(None, Tag::Div, "subtotal-label", format!("Item total: {}", subtotal));
                page.push(None, Tag::Div, "tax-label", format!("Tax: {}", tax));
                page.push(None, Tag::Div, "total-label", format!("Total: {}", total));
                let finish = page.push(None, Tag::Button, "finish", "Finish");
                page.with_action(finish, Action::Finish);
            }
            ScreenState::Complete => {
                let container = page.push(None, Tag::Div, "checkout-complete-container", "");
                page.push(Some(container), Tag::Span, "complete-header", ORDER_CONFIRMATION_MESSAGE);
                page.push(
                    Some(container),
                    Tag::Div,
                    "complete-text",
                    "Your order has been dispatched, and will arrive just as fast as the pony can get there!",
                );
                let home = page.push(Some(container), Tag::Button, "back-to-products", "Back Home");
                page.with_action(home, Action::BackHome);
            }
        }
        page
    }

    fn field_mut(&mut self, field: Field) -> &mut String {
        match field {
            Field::Username => &mut self.username,
            Field::Password => &mut self.password,
            Field::FirstName => &mut self.first_name,
            Field::LastName => &mut self.last_name,
            Field::PostalCode => &mut self.postal_code,
        }
    }

    fn navigate_now(&mut self, screen: ScreenState) {
        self.path = screen.path().to_string();
    }

    fn press(&mut self, action: Action, config: &FakeConfig) {
        let delay = config.glitch_delay;
        match action {
            Action::Input(_) | Action::Sort => {}
            Action::Login => self.login(delay),
            Action::AddToCart(product) => {
                let broken = matches!(
                    product,
                    ProductKey::BoltTShirt | ProductKey::FleeceJacket | ProductKey::RedTShirt
                );
                if !(self.user == Some(Persona::Problem) && broken) {
                    self.schedule(Effect::AddToCart(product), delay);
                }
            }
            Action::Remove(product) => self.cart.retain(|p| *p != product),
            Action::OpenCart => self.schedule(Effect::Navigate(ScreenState::Cart.path()), delay),
            Action::ContinueShopping | Action::BackHome => {
                self.schedule(Effect::Navigate(ScreenState::Listing.path()), delay)
            }
            Action::Checkout => {
                self.checkout_error = None;
                self.schedule(Effect::Navigate(ScreenState::CheckoutInfo.path()), delay)
            }
            Action::Continue => {
                let error = if self.first_name.is_empty() {
                    Some(FIRST_NAME_REQUIRED_MESSAGE)
                } else if self.last_name.is_empty() {
                    Some(LAST_NAME_REQUIRED_MESSAGE)
                } else if self.postal_code.is_empty() {
                    Some(POSTAL_CODE_REQUIRED_MESSAGE)
                } else {
                    None
                };
                match error {
                    Some(message) => self.checkout_error = Some(message.to_string()),
                    None => {
                        self.checkout_error = None;
                        self.schedule(Effect::Navigate(ScreenState::CheckoutOverview.path()), delay)
                    }
                }
            }
            Action::Finish => {
                self.cart.clear();
                self.schedule(Effect::Navigate(ScreenState::Complete.path()), delay)
            }
        }
    }

    fn login(&mut self, delay: Duration) {
        let error = if self.username.is_empty() {
            Some(USERNAME_REQUIRED_MESSAGE)
        } else if self.password.is_empty() {
            Some(PASSWORD_REQUIRED_MESSAGE)
        } else {
            match Persona::from_identifier(&self.username) {
                Some(_) if self.password != SHARED_SECRET => Some(BAD_CREDENTIALS_MESSAGE),
                None => Some(BAD_CREDENTIALS_MESSAGE),
                Some(Persona::LockedOut) => Some(LOCKED_OUT_MESSAGE),
                Some(persona) => {
                    self.user = Some(persona);
                    None
                }
            }
        };
        match error {
            Some(message) => self.login_error = Some(message.to_string()),
            None => {
                self.login_error = None;
                self.schedule(Effect::Navigate(ScreenState::Listing.path()), delay);
            }
        }
    }

    fn goto(&mut self, path: &str) {
        let screen = ScreenState::from_url(path);
        match screen {
            Some(ScreenState::Login) => {
                self.user = None;
                self.cart.clear();
                self.navigate_now(ScreenState::Login);
            }
            Some(protected) if self.user.is_none() => {
                self.login_error = Some(format!(
                    "Epic sadface: You can only access '{}' when you are logged in.",
                    protected.path()
                ));
                self.navigate_now(ScreenState::Login);
            }
            _ => self.path = path.to_string(),
        }
    }
}

/// One fake browser session
pub struct FakeStorefront {
    config: Arc<FakeConfig>,
    shop: Mutex<Shop>,
    closed: AtomicBool,
    on_close: Option<Arc<AtomicUsize>>,
}

impl FakeStorefront {
    pub fn new(config: FakeConfig) -> Self {
        Self {
            config: Arc::new(config),
            shop: Mutex::new(Shop::new()),
            closed: AtomicBool::new(false),
            on_close: None,
        }
    }

    pub fn is_closed(&self) -> bool {
        self.closed.load(Ordering::SeqCst)
    }

    /// Products currently in the cart, in the order they were added
    pub fn cart(&self) -> Vec<ProductKey> {
        let mut shop = self.shop.lock();
        shop.settle();
        shop.cart.clone()
    }

    fn check_open(&self) -> DriverResult<()> {
        if self.is_closed() {
            Err(DriverError::Closed)
        } else {
            Ok(())
        }
    }

    /// Settle pending effects, render, and hand the page plus the matched node to `f`
    fn with_node<T>(
        &self,
        locator: &Locator,
        index: usize,
        f: impl FnOnce(&mut Shop, &Node) -> DriverResult<T>,
    ) -> DriverResult<T> {
        self.check_open()?;
        let mut shop = self.shop.lock();
        shop.settle();
        let page = shop.render(&self.config);
        let node = page
            .find(locator)
            .get(index)
            .map(|i| page.nodes[*i].clone())
            .ok_or_else(|| DriverError::NoSuchElement {
                locator: locator.to_string(),
                index,
            })?;
        f(&mut *shop, &node)
    }

    fn render_text(&self, locator: &Locator, index: usize) -> DriverResult<String> {
        self.check_open()?;
        let mut shop = self.shop.lock();
        shop.settle();
        let page = shop.render(&self.config);
        page.find(locator)
            .get(index)
            .map(|i| page.full_text(*i))
            .ok_or_else(|| DriverError::NoSuchElement {
                locator: locator.to_string(),
                index,
            })
    }
}

impl Default for FakeStorefront {
    fn default() -> Self {
        Self::new(FakeConfig::default())
    }
}

/// Path part of `url`, relative to any scheme and host
fn path_of(url: &str) -> &str {
    match url.split_once("://") {
        Some((_, rest)) => rest.find('/').map(|i| &rest[i..]).unwrap_or("/"),
        None => url,
    }
}

#[async_trait]
impl Driver for FakeStorefront {
    async fn goto(&self, url: &str) -> DriverResult<()> {
        self.check_open()?;
        let mut shop = self.shop.lock();
        shop.settle();
        shop.goto(path_of(url));
        Ok(())
    }

    async fn current_url(&self) -> DriverResult<String> {
        self.check_open()?;
        let mut shop = self.shop.lock();
        shop.settle();
        Ok(format!("{}{}", self.config.base_url, shop.path))
    }

    async fn count(&self, locator: &Locator) -> DriverResult<usize> {
        self.check_open()?;
        let mut shop = self.shop.lock();
        shop.settle();
        Ok(shop.render(&self.config).find(locator).len())
    }

    async fn is_displayed(&self, locator: &Locator, index: usize) -> DriverResult<bool> {
        self.with_node(locator, index, |_, _| Ok(true))
    }

    async fn click(&self, locator: &Locator, index: usize) -> DriverResult<()> {
        let config = Arc::clone(&self.config);
        self.with_node(locator, index, |shop, node| {
            if let Some(action) = node.action {
                shop.press(action, &config);
            }
            Ok(())
        })
    }

    async fn fill(&self, locator: &Locator, index: usize, value: &str) -> DriverResult<()> {
        self.with_node(locator, index, |shop, node| match node.action {
            Some(Action::Input(field)) => {
                *shop.field_mut(field) = value.to_string();
                Ok(())
            }
            _ => Err(DriverError::Command(format!(
                "element {} is not a text input",
                locator
            ))),
        })
    }

    async fn select_option(&self, locator: &Locator, index: usize, value: &str) -> DriverResult<()> {
        self.with_node(locator, index, |shop, node| match node.action {
            Some(Action::Sort) => {
                shop.sort = SortOrder::from_option_value(value)
                    .map_err(|e| DriverError::Command(e.to_string()))?;
                Ok(())
            }
            _ => Err(DriverError::Command(format!("element {} is not a select", locator))),
        })
    }

    async fn text(&self, locator: &Locator, index: usize) -> DriverResult<String> {
        self.render_text(locator, index)
    }

    async fn attribute(
        &self,
        locator: &Locator,
        index: usize,
        name: &str,
    ) -> DriverResult<Option<String>> {
        self.with_node(locator, index, |_, node| {
            Ok(node
                .attrs
                .iter()
                .find(|(attr, _)| *attr == name)
                .map(|(_, value)| value.clone()))
        })
    }

    async fn close(&self) -> DriverResult<()> {
        if !self.config.close_delay.is_zero() {
            tokio::time::sleep(self.config.close_delay).await;
        }
        if self.closed.swap(true, Ordering::SeqCst) {
            return Err(DriverError::Closed);
        }
        if let Some(counter) = &self.on_close {
            counter.fetch_add(1, Ordering::SeqCst);
        }
        Ok(())
    }
}

/// Opens independent [`FakeStorefront`]s and counts them
#[derive(Clone, Default)]
pub struct FakeStorefrontFactory {
    config: FakeConfig,
    opened: Arc<AtomicUsize>,
    closed: Arc<AtomicUsize>,
}

impl FakeStorefrontFactory {
    pub fn new(config: FakeConfig) -> Self {
        Self {
            config,
            ..Default::default()
        }
    }

    pub fn with_glitch_delay(mut self, delay: Duration) -> Self {
        self.config.glitch_delay = delay;
        self
    }

    pub fn with_total_skew(mut self, cents: i64) -> Self {
        self.config.total_skew_cents = cents;
        self
    }

    pub fn with_open_delay(mut self, delay: Duration) -> Self {
        self.config.open_delay = delay;
        self
    }

    pub fn with_close_delay(mut self, delay: Duration) -> Self {
        self.config.close_delay = delay;
        self
    }

    pub fn opened(&self) -> usize {
        self.opened.load(Ordering::SeqCst)
    }

    pub fn closed(&self) -> usize {
        self.closed.load(Ordering::SeqCst)
    }

    /// Sessions opened and not yet closed
    pub fn live(&self) -> usize {
        self.opened() - self.closed()
    }
}

#[async_trait]
impl DriverFactory for FakeStorefrontFactory {
    async fn open(&self) -> DriverResult<Arc<dyn Driver>> {
        if !self.config.open_delay.is_zero() {
            tokio::time::sleep(self.config.open_delay).await;
        }
        self.opened.fetch_add(1, Ordering::SeqCst);
        let mut storefront = FakeStorefront::new(self.config.clone());
        storefront.on_close = Some(Arc::clone(&self.closed));
        Ok(Arc::new(storefront))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn login(driver: &FakeStorefront, user: &str, pass: &str) -> DriverResult<()> {
        let mut shop = driver.shop.lock();
        shop.username = user.to_string();
        shop.password = pass.to_string();
        shop.press(Action::Login, &driver.config);
        Ok(())
    }

    #[tokio::test]
    async fn renders_login_page() {
        let driver = FakeStorefront::default();
        driver.goto(DEFAULT_BASE_URL).await.unwrap();
        assert_eq!(driver.count(&Locator::test_id("login-button")).await.unwrap(), 1);
        assert_eq!(
            driver.current_url().await.unwrap(),
            "https://www.saucedemo.com/"
        );
    }

    #[tokio::test]
    async fn protected_pages_redirect_to_login() {
        let driver = FakeStorefront::default();
        driver
            .goto("https://www.saucedemo.com/inventory.html")
            .await
            .unwrap();
        assert!(driver.current_url().await.unwrap().ends_with(".com/"));
        assert_eq!(
            driver.text(&Locator::test_id("error"), 0).await.unwrap(),
            "Epic sadface: You can only access '/inventory.html' when you are logged in."
        );
    }

    #[tokio::test]
    async fn scoped_locators_pick_the_right_item() {
        let driver = FakeStorefront::default();
        login(&driver, "standard_user", "secret_sauce").unwrap();
        let jacket_button = Locator::test_id("inventory-item")
            .containing("Sauce Labs Fleece Jacket")
            .descendant(Locator::test_id_prefix("add-to-cart"));
        assert_eq!(driver.count(&jacket_button).await.unwrap(), 1);
        driver.click(&jacket_button, 0).await.unwrap();
        assert_eq!(driver.cart(), vec![ProductKey::FleeceJacket]);
        assert_eq!(driver.count(&jacket_button).await.unwrap(), 0);
    }

    #[tokio::test]
    async fn role_locator_counts_add_buttons() {
        let driver = FakeStorefront::default();
        login(&driver, "standard_user", "secret_sauce").unwrap();
        let add = Locator::role(Role::Button, "Add to cart");
        assert_eq!(driver.count(&add).await.unwrap(), 6);
        driver.click(&add, 2).await.unwrap();
        assert_eq!(driver.count(&add).await.unwrap(), 5);
    }

    #[tokio::test]
    async fn glitch_persona_effects_land_late() {
        let driver = FakeStorefront::new(FakeConfig {
            glitch_delay: Duration::from_millis(40),
            ..Default::default()
        });
        login(&driver, "performance_glitch_user", "secret_sauce").unwrap();
        assert!(driver.current_url().await.unwrap().ends_with(".com/"));
        tokio::time::sleep(Duration::from_millis(60)).await;
        assert!(driver.current_url().await.unwrap().ends_with("/inventory.html"));
    }

    #[tokio::test]
    async fn closed_driver_refuses_commands() {
        let driver = FakeStorefront::default();
        assert!(!driver.is_closed());
        driver.close().await.unwrap();
        assert!(driver.is_closed());
        assert_eq!(driver.goto("/").await, Err(DriverError::Closed));
        assert_eq!(driver.close().await, Err(DriverError::Closed));
    }

    #[test]
    fn tax_rounds_half_up() {
        let mut shop = Shop::new();
        shop.cart = vec![ProductKey::Backpack];
        assert_eq!(shop.tax(), MoneyAmount::from_cents(240));
        shop.cart.push(ProductKey::FleeceJacket);
        assert_eq!(shop.subtotal(), MoneyAmount::from_cents(7998));
        assert_eq!(shop.tax(), MoneyAmount::from_cents(640));
    }
}
