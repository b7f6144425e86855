// storefront/src/pipelines/view_cart.rs

use crate::errors::AppError;
use crate::pipelines::common_steps::{project_cart_step, resolve_cart_step};
use crate::pipelines::contexts::ViewCartCtxData;
use crate::store::StoreTx;
use txflow::Pipeline;

/// Viewing creates the cart on first use, so the run always writes through a
/// unit even though it only reads afterwards.
pub fn view_cart_pipeline<T: StoreTx>() -> Pipeline<ViewCartCtxData, T, AppError> {
  let mut p = Pipeline::<ViewCartCtxData, T, AppError>::new(&[("resolve_cart", false, None), ("project_cart", false, None)]);
  p.on_step("resolve_cart", resolve_cart_step::<ViewCartCtxData, T>);
  p.on_step("project_cart", project_cart_step::<ViewCartCtxData, T>);
  p
}
