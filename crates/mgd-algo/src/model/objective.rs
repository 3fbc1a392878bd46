//! Operating cost over the horizon.
//!
//! ```text
//! cost(t) = c_buy(t)·buy(t) − s·c_buy(t)·sell(t) + Σ_g c_g·p(g,t)
//! J       = Σ_t cost(t)
//! ```

use super::variables::VariableSchema;
use good_lp::Expression;
use mgd_core::ParameterSet;

/// Cost of hour `t` as a linear expression.
pub fn hour_cost(params: &ParameterSet, schema: &VariableSchema, t: usize) -> Expression {
    let price = params.grid_price[t];
    let mut cost = price * schema.grid_buy[t] - params.price_scale * price * schema.grid_sell[t];
    for (gen, output) in params.generators.iter().zip(&schema.generator_output) {
        cost += gen.cost_per_mwh * output[t];
    }
    cost
}

/// Per-hour costs for the whole horizon.
pub fn hourly_costs(params: &ParameterSet, schema: &VariableSchema) -> Vec<Expression> {
    params
        .horizon
        .iter()
        .map(|t| hour_cost(params, schema, t))
        .collect()
}

/// Sum of the per-hour costs.
pub fn total_cost(hourly: &[Expression]) -> Expression {
    hourly.iter().cloned().sum()
}
