// Token amounts and consensus power

/// Integer token amount (smallest denomination)
pub type Amount = u128;

/// Tokens per unit of consensus power
pub const DEFAULT_POWER_REDUCTION: Amount = 1_000_000;

/// Consensus power backed by `tokens`, saturating at `u64::MAX`
pub fn tokens_to_consensus_power(tokens: Amount, power_reduction: Amount) -> u64 {
    if power_reduction == 0 {
        return 0;
    }
    u64::try_from(tokens / power_reduction).unwrap_or(u64::MAX)
}

/// Tokens needed for `power` units of consensus power
pub fn tokens_from_consensus_power(power: u64, power_reduction: Amount) -> Amount {
    Amount::from(power).saturating_mul(power_reduction)
}
