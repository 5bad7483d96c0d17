use std::collections::HashMap;

use basegem_core::flux_analysis::comparison;
use basegem_core::io::json::JsonError;
use basegem_core::metabolic_model::model::Model;
use basegem_core::reconstruction::{base_model, mapping, pruning};

use indexmap::{IndexMap, IndexSet};
use pyo3::exceptions::{PyIOError, PyRuntimeError, PyValueError};
use pyo3::prelude::*;

#[pyclass]
struct PyModel {
    inner: Model,
}

#[pymethods]
impl PyModel {
    /// Read a model from a cobrapy formatted JSON file
    #[staticmethod]
    fn read_json(path: String) -> PyResult<Self> {
        let inner = Model::read_json(&path).map_err(|e| match e {
            JsonError::NotJsonPath(_) => PyValueError::new_err(e.to_string()),
            _ => PyIOError::new_err(e.to_string()),
        })?;
        Ok(PyModel { inner })
    }

    fn write_json(&self, path: String) -> PyResult<()> {
        self.inner
            .write_json(&path)
            .map_err(|e| PyIOError::new_err(e.to_string()))
    }

    fn gene_ids(&self) -> Vec<String> {
        self.inner.genes.keys().cloned().collect()
    }

    fn reaction_ids(&self) -> Vec<String> {
        self.inner.reactions.keys().cloned().collect()
    }

    /// Objective value of the model, None if it can't be solved
    fn slim_optimize(&self) -> PyResult<Option<f64>> {
        let solution = self
            .inner
            .optimize()
            .map_err(|e| PyRuntimeError::new_err(e.to_string()))?;
        Ok(solution.objective_value)
    }
}

#[pyclass]
#[derive(Clone)]
struct PyGeneMappingRecord {
    inner: mapping::GeneMappingRecord,
}

#[pymethods]
impl PyGeneMappingRecord {
    #[new]
    #[pyo3(signature = (qseqid, sseqid, tair_id=None, pident=0., evalue=0., bitscore=0.))]
    fn new(
        qseqid: String,
        sseqid: String,
        tair_id: Option<String>,
        pident: f64,
        evalue: f64,
        bitscore: f64,
    ) -> Self {
        PyGeneMappingRecord {
            inner: mapping::GeneMappingRecord {
                qseqid,
                sseqid,
                tair_id,
                pident,
                evalue,
                bitscore,
            },
        }
    }

    #[getter]
    fn qseqid(&self) -> String {
        self.inner.qseqid.clone()
    }

    #[getter]
    fn sseqid(&self) -> String {
        self.inner.sseqid.clone()
    }

    #[getter]
    fn tair_id(&self) -> Option<String> {
        self.inner.tair_id.clone()
    }
}

/// Build the gene mapping from a reference proteome and diamond output
#[pyfunction]
fn map_proteome(
    reference_proteome: String,
    diamond_output: String,
) -> PyResult<Vec<PyGeneMappingRecord>> {
    let records = mapping::map_proteome(reference_proteome, diamond_output)
        .map_err(|e| PyIOError::new_err(e.to_string()))?;
    Ok(records
        .into_iter()
        .map(|inner| PyGeneMappingRecord { inner })
        .collect())
}

#[pyfunction]
fn compute_target_genes(gene_mapping: Vec<PyGeneMappingRecord>) -> Vec<String> {
    let records: Vec<mapping::GeneMappingRecord> =
        gene_mapping.into_iter().map(|r| r.inner).collect();
    pruning::compute_target_genes(&records).into_iter().collect()
}

#[pyfunction]
#[pyo3(signature = (model, target_genes, verbose=true))]
fn compute_genes_to_remove(model: &PyModel, target_genes: Vec<String>, verbose: bool) -> Vec<String> {
    let target_genes: IndexSet<String> = target_genes.into_iter().collect();
    pruning::compute_genes_to_remove(&model.inner, &target_genes, verbose)
        .into_iter()
        .collect()
}

#[pyfunction]
fn prune_genes_to_remove(model: &PyModel, genes_to_remove: Vec<String>) -> PyResult<Vec<String>> {
    let genes_to_remove: IndexSet<String> = genes_to_remove.into_iter().collect();
    let pruned = pruning::prune_genes_to_remove(&model.inner, &genes_to_remove)
        .map_err(|e| PyRuntimeError::new_err(e.to_string()))?;
    Ok(pruned.into_iter().collect())
}

#[pyfunction]
fn generate_base_model(
    model: &PyModel,
    genes_to_remove: Vec<String>,
    save_path: String,
) -> PyResult<PyModel> {
    let inner = base_model::generate_base_model(&model.inner, &genes_to_remove, &save_path)
        .map_err(|e| PyValueError::new_err(e.to_string()))?;
    Ok(PyModel { inner })
}

/// Kolmogorov-Smirnov comparison of two flux sample tables, as (reaction, statistic, p-value)
/// rows. With `n_hits`, only the rows with the largest p-values are returned.
#[pyfunction]
#[pyo3(signature = (model, samples_1, samples_2, n_hits=None))]
fn compare_flux_samples(
    model: &PyModel,
    samples_1: HashMap<String, Vec<f64>>,
    samples_2: HashMap<String, Vec<f64>>,
    n_hits: Option<usize>,
) -> PyResult<Vec<(String, f64, f64)>> {
    let samples_1: IndexMap<String, Vec<f64>> = samples_1.into_iter().collect();
    let samples_2: IndexMap<String, Vec<f64>> = samples_2.into_iter().collect();
    let result = comparison::compare_flux_samples(&model.inner, &samples_1, &samples_2)
        .map_err(|e| PyValueError::new_err(e.to_string()))?;
    let rows: Vec<&comparison::KsResult> = match n_hits {
        Some(n) => result.top_hits(n),
        None => result.results.iter().collect(),
    };
    Ok(rows
        .into_iter()
        .map(|r| (r.reaction.clone(), r.statistic, r.p_value))
        .collect())
}

/// A Python module implemented in Rust. The name of this function must match
/// the `lib.name` setting in the `Cargo.toml`, else Python will not be able to
/// import the module.
#[pymodule]
fn _core(m: &Bound<'_, PyModule>) -> PyResult<()> {
    m.add_class::<PyModel>()?;
    m.add_class::<PyGeneMappingRecord>()?;
    m.add_function(wrap_pyfunction!(map_proteome, m)?)?;
    m.add_function(wrap_pyfunction!(compute_target_genes, m)?)?;
    m.add_function(wrap_pyfunction!(compute_genes_to_remove, m)?)?;
    m.add_function(wrap_pyfunction!(prune_genes_to_remove, m)?)?;
    m.add_function(wrap_pyfunction!(generate_base_model, m)?)?;
    m.add_function(wrap_pyfunction!(compare_flux_samples, m)?)?;
    Ok(())
}
