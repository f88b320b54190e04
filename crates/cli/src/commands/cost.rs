use super::build_params;
use crate::cli::ParamArgs;
use crate::error::Result;

pub fn execute(params: &ParamArgs, opus: bool) -> Result<()> {
    let params = build_params(params)?;
    println!("{}", params.calculate_cost(opus));
    Ok(())
}
