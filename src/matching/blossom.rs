//! Edmonds' blossom algorithm for maximum-weight matching.
//!
//! # Algorithm
//!
//! Primal-dual blossom method in the formulation of Galil (1986), always in
//! maximum-cardinality mode: among all matchings of maximum size, one of
//! maximum total weight is returned. Vertex duals are stored doubled so all
//! arithmetic stays integral.
//!
//! Vertices are `0..n`. Non-trivial blossoms are numbered `n..2n`. Edge `k`
//! has endpoints `2k` and `2k + 1`.
//!
//! # Complexity
//!
//! O(n³) time, O(n + m) space.
//!
//! # Reference
//!
//! Galil, Z. (1986). "Efficient algorithms for finding maximum matching in
//! graphs", *ACM Computing Surveys* 18(1), 23-38.

use crate::error::{ArcRouteError, Result};

pub(crate) const NONE: usize = usize::MAX;

const FREE: u8 = 0;
const S_LABEL: u8 = 1;
const T_LABEL: u8 = 2;
const BREADCRUMB: u8 = 4;

pub(crate) struct Blossom {
    nvertex: usize,
    edges: Vec<(usize, usize, i64)>,
    /// Vertex owning each edge endpoint.
    endpoint: Vec<usize>,
    /// Remote endpoints of the edges incident to each vertex.
    neighbend: Vec<Vec<usize>>,
    /// Remote endpoint of the matched edge, or NONE if single.
    mate: Vec<usize>,
    label: Vec<u8>,
    /// Remote endpoint of the edge through which a blossom got its label.
    labelend: Vec<usize>,
    /// Top-level blossom containing each vertex.
    inblossom: Vec<usize>,
    blossomparent: Vec<usize>,
    /// Sub-blossoms, starting at the base and going round the blossom.
    blossomchilds: Vec<Vec<usize>>,
    blossombase: Vec<usize>,
    /// Endpoints of the edges connecting consecutive sub-blossoms.
    blossomendps: Vec<Vec<usize>>,
    /// Least-slack edge to an S-blossom.
    bestedge: Vec<usize>,
    blossombestedges: Vec<Option<Vec<usize>>>,
    unusedblossoms: Vec<usize>,
    dualvar: Vec<i64>,
    /// Edges known to have zero slack.
    allowedge: Vec<bool>,
    queue: Vec<usize>,
}

impl Blossom {
    /// Prepares a matching over vertices `0..nvertex`.
    ///
    /// Edges must join distinct vertices below `nvertex`, at most one edge
    /// per pair.
    pub(crate) fn new(nvertex: usize, edges: Vec<(usize, usize, i64)>) -> Self {
        let nedge = edges.len();
        let maxweight = edges.iter().map(|e| e.2).max().unwrap_or(0).max(0);

        let endpoint = (0..2 * nedge)
            .map(|p| if p % 2 == 0 { edges[p / 2].0 } else { edges[p / 2].1 })
            .collect();
        let mut neighbend = vec![Vec::new(); nvertex];
        for (k, &(i, j, _)) in edges.iter().enumerate() {
            neighbend[i].push(2 * k + 1);
            neighbend[j].push(2 * k);
        }

        let mut blossombase: Vec<usize> = (0..nvertex).collect();
        blossombase.extend(std::iter::repeat(NONE).take(nvertex));
        let mut dualvar = vec![maxweight; nvertex];
        dualvar.extend(std::iter::repeat(0).take(nvertex));

        Self {
            nvertex,
            edges,
            endpoint,
            neighbend,
            mate: vec![NONE; nvertex],
            label: vec![FREE; 2 * nvertex],
            labelend: vec![NONE; 2 * nvertex],
            inblossom: (0..nvertex).collect(),
            blossomparent: vec![NONE; 2 * nvertex],
            blossomchilds: vec![Vec::new(); 2 * nvertex],
            blossombase,
            blossomendps: vec![Vec::new(); 2 * nvertex],
            bestedge: vec![NONE; 2 * nvertex],
            blossombestedges: vec![None; 2 * nvertex],
            unusedblossoms: (nvertex..2 * nvertex).collect(),
            dualvar,
            allowedge: vec![false; nedge],
            queue: Vec::new(),
        }
    }

    /// Twice the slack of edge `k`. Not valid for edges inside a blossom.
    fn slack(&self, k: usize) -> i64 {
        let (i, j, wt) = self.edges[k];
        self.dualvar[i] + self.dualvar[j] - 2 * wt
    }

    fn blossom_leaves(&self, b: usize) -> Vec<usize> {
        if b < self.nvertex {
            return vec![b];
        }
        let mut leaves = Vec::new();
        for &t in &self.blossomchilds[b] {
            if t < self.nvertex {
                leaves.push(t);
            } else {
                leaves.extend(self.blossom_leaves(t));
            }
        }
        leaves
    }

    /// Labels the top-level blossom containing `w` with `t`, reached through
    /// the edge with remote endpoint `p`.
    fn assign_label(&mut self, w: usize, t: u8, p: usize) {
        let b = self.inblossom[w];
        self.label[w] = t;
        self.label[b] = t;
        self.labelend[w] = p;
        self.labelend[b] = p;
        self.bestedge[w] = NONE;
        self.bestedge[b] = NONE;
        if t == S_LABEL {
            let leaves = self.blossom_leaves(b);
            self.queue.extend(leaves);
        } else if t == T_LABEL {
            // The base of a T-blossom is always matched; label its mate S.
            let base = self.blossombase[b];
            let mbase = self.mate[base];
            self.assign_label(self.endpoint[mbase], S_LABEL, mbase ^ 1);
        }
    }

    /// Traces back from `v` and `w` to find either a new blossom (returns
    /// its base) or an augmenting path (returns NONE).
    fn scan_blossom(&mut self, v: usize, w: usize) -> usize {
        let mut path = Vec::new();
        let mut base = NONE;
        let (mut v, mut w) = (v, w);
        while v != NONE || w != NONE {
            let mut b = self.inblossom[v];
            if self.label[b] & BREADCRUMB != 0 {
                base = self.blossombase[b];
                break;
            }
            path.push(b);
            self.label[b] = S_LABEL | BREADCRUMB;
            if self.labelend[b] == NONE {
                // Base of b is single; stop tracing this side.
                v = NONE;
            } else {
                v = self.endpoint[self.labelend[b]];
                b = self.inblossom[v];
                v = self.endpoint[self.labelend[b]];
            }
            if w != NONE {
                std::mem::swap(&mut v, &mut w);
            }
        }
        for b in path {
            self.label[b] = S_LABEL;
        }
        base
    }

    /// Builds a new S-blossom with the given base around edge `k`.
    fn add_blossom(&mut self, base: usize, k: usize) -> Result<()> {
        let (v, w, _) = self.edges[k];
        let bb = self.inblossom[base];
        let mut bv = self.inblossom[v];
        let mut bw = self.inblossom[w];

        let b = self
            .unusedblossoms
            .pop()
            .ok_or_else(|| ArcRouteError::invariant("blossom numbers exhausted"))?;
        self.blossombase[b] = base;
        self.blossomparent[b] = NONE;
        self.blossomparent[bb] = b;

        let mut childs = Vec::new();
        let mut endps = Vec::new();
        while bv != bb {
            self.blossomparent[bv] = b;
            childs.push(bv);
            endps.push(self.labelend[bv]);
            bv = self.inblossom[self.endpoint[self.labelend[bv]]];
        }
        childs.push(bb);
        childs.reverse();
        endps.reverse();
        endps.push(2 * k);
        while bw != bb {
            self.blossomparent[bw] = b;
            childs.push(bw);
            endps.push(self.labelend[bw] ^ 1);
            bw = self.inblossom[self.endpoint[self.labelend[bw]]];
        }
        self.blossomchilds[b] = childs;
        self.blossomendps[b] = endps;

        self.label[b] = S_LABEL;
        self.labelend[b] = self.labelend[bb];
        self.dualvar[b] = 0;

        for v in self.blossom_leaves(b) {
            if self.label[self.inblossom[v]] == T_LABEL {
                // Former T-vertex inside a new S-blossom
                self.queue.push(v);
            }
            self.inblossom[v] = b;
        }

        let mut bestedgeto = vec![NONE; 2 * self.nvertex];
        for bv in self.blossomchilds[b].clone() {
            let nblists: Vec<Vec<usize>> = match self.blossombestedges[bv].take() {
                Some(list) => vec![list],
                None => self
                    .blossom_leaves(bv)
                    .into_iter()
                    .map(|v| self.neighbend[v].iter().map(|p| p / 2).collect())
                    .collect(),
            };
            for k in nblists.into_iter().flatten() {
                let (i, j, _) = self.edges[k];
                let j = if self.inblossom[j] == b { i } else { j };
                let bj = self.inblossom[j];
                if bj != b
                    && self.label[bj] == S_LABEL
                    && (bestedgeto[bj] == NONE || self.slack(k) < self.slack(bestedgeto[bj]))
                {
                    bestedgeto[bj] = k;
                }
            }
            self.bestedge[bv] = NONE;
        }
        let list: Vec<usize> = bestedgeto.into_iter().filter(|&k| k != NONE).collect();
        self.bestedge[b] = NONE;
        for &k in &list {
            if self.bestedge[b] == NONE || self.slack(k) < self.slack(self.bestedge[b]) {
                self.bestedge[b] = k;
            }
        }
        self.blossombestedges[b] = Some(list);
        Ok(())
    }

    /// Dissolves top-level blossom `b` into its sub-blossoms.
    fn expand_blossom(&mut self, b: usize, endstage: bool) -> Result<()> {
        for s in self.blossomchilds[b].clone() {
            self.blossomparent[s] = NONE;
            if s < self.nvertex {
                self.inblossom[s] = s;
            } else if endstage && self.dualvar[s] == 0 {
                self.expand_blossom(s, endstage)?;
            } else {
                for v in self.blossom_leaves(s) {
                    self.inblossom[v] = s;
                }
            }
        }

        // A T-blossom expanded mid-stage must relabel its sub-blossoms.
        if !endstage && self.label[b] == T_LABEL {
            let entrychild = self.inblossom[self.endpoint[self.labelend[b] ^ 1]];
            let (mut j, jstep, endptrick) = self.walk_start(b, entrychild)?;

            let mut p = self.labelend[b];
            while j != 0 {
                // Relabel the T-sub-blossom.
                self.label[self.endpoint[p ^ 1]] = FREE;
                let q = wrap(&self.blossomendps[b], j - endptrick as isize);
                self.label[self.endpoint[q ^ endptrick ^ 1]] = FREE;
                self.assign_label(self.endpoint[p ^ 1], T_LABEL, p);
                // Step to the next S-sub-blossom and note its forward endpoint.
                self.allowedge[q / 2] = true;
                j += jstep;
                p = wrap(&self.blossomendps[b], j - endptrick as isize) ^ endptrick;
                // Step to the next T-sub-blossom.
                self.allowedge[p / 2] = true;
                j += jstep;
            }

            // Relabel the base T-sub-blossom without stepping through to its mate.
            let bv = wrap(&self.blossomchilds[b], j);
            self.label[self.endpoint[p ^ 1]] = T_LABEL;
            self.label[bv] = T_LABEL;
            self.labelend[self.endpoint[p ^ 1]] = p;
            self.labelend[bv] = p;
            self.bestedge[bv] = NONE;
            j += jstep;

            while wrap(&self.blossomchilds[b], j) != entrychild {
                let bv = wrap(&self.blossomchilds[b], j);
                if self.label[bv] == S_LABEL {
                    j += jstep;
                    continue;
                }
                // Label T if some vertex of the sub-blossom is reachable from outside.
                let reached = self
                    .blossom_leaves(bv)
                    .into_iter()
                    .find(|&v| self.label[v] != FREE);
                if let Some(v) = reached {
                    self.label[v] = FREE;
                    let mate_end = self.mate[self.blossombase[bv]];
                    self.label[self.endpoint[mate_end]] = FREE;
                    let lblend = self.labelend[v];
                    self.assign_label(v, T_LABEL, lblend);
                }
                j += jstep;
            }
        }

        // Recycle the blossom number.
        self.label[b] = FREE;
        self.labelend[b] = NONE;
        self.blossombase[b] = NONE;
        self.bestedge[b] = NONE;
        self.blossomchilds[b].clear();
        self.blossomendps[b].clear();
        self.blossombestedges[b] = None;
        self.unusedblossoms.push(b);
        Ok(())
    }

    /// Picks the direction to walk round blossom `b` from `child` to its base.
    ///
    /// Returns the signed start index, the step, and the endpoint trick bit.
    fn walk_start(&self, b: usize, child: usize) -> Result<(isize, isize, usize)> {
        let childs = &self.blossomchilds[b];
        let i = childs
            .iter()
            .position(|&c| c == child)
            .ok_or_else(|| ArcRouteError::invariant("sub-blossom missing from parent"))?;
        if i & 1 != 0 {
            // Odd start index: go forward and wrap.
            Ok((i as isize - childs.len() as isize, 1, 0))
        } else {
            // Even start index: go backward.
            Ok((i as isize, -1, 1))
        }
    }

    /// Swaps matched and unmatched edges along the alternating path through
    /// blossom `b` from vertex `v` to the base.
    fn augment_blossom(&mut self, b: usize, v: usize) -> Result<()> {
        let mut t = v;
        while self.blossomparent[t] != b {
            t = self.blossomparent[t];
        }
        if t >= self.nvertex {
            self.augment_blossom(t, v)?;
        }

        let (mut j, jstep, endptrick) = self.walk_start(b, t)?;
        let i = j.rem_euclid(self.blossomchilds[b].len() as isize) as usize;
        while j != 0 {
            j += jstep;
            let t = wrap(&self.blossomchilds[b], j);
            let p = wrap(&self.blossomendps[b], j - endptrick as isize) ^ endptrick;
            if t >= self.nvertex {
                self.augment_blossom(t, self.endpoint[p])?;
            }
            j += jstep;
            let t = wrap(&self.blossomchilds[b], j);
            if t >= self.nvertex {
                self.augment_blossom(t, self.endpoint[p ^ 1])?;
            }
            // Match the edge connecting those sub-blossoms.
            self.mate[self.endpoint[p]] = p ^ 1;
            self.mate[self.endpoint[p ^ 1]] = p;
        }

        // Rotate so the new base comes first.
        self.blossomchilds[b].rotate_left(i);
        self.blossomendps[b].rotate_left(i);
        self.blossombase[b] = self.blossombase[self.blossomchilds[b][0]];
        Ok(())
    }

    /// Augments the matching along the path through edge `k`, which joins
    /// two S-vertices in different trees.
    fn augment_matching(&mut self, k: usize) -> Result<()> {
        let (v, w, _) = self.edges[k];
        for (mut s, mut p) in [(v, 2 * k + 1), (w, 2 * k)] {
            loop {
                let bs = self.inblossom[s];
                if bs >= self.nvertex {
                    self.augment_blossom(bs, s)?;
                }
                self.mate[s] = p;
                if self.labelend[bs] == NONE {
                    // Reached a single vertex.
                    break;
                }
                let t = self.endpoint[self.labelend[bs]];
                let bt = self.inblossom[t];
                s = self.endpoint[self.labelend[bt]];
                let j = self.endpoint[self.labelend[bt] ^ 1];
                if bt >= self.nvertex {
                    self.augment_blossom(bt, j)?;
                }
                self.mate[j] = self.labelend[bt];
                p = self.labelend[bt] ^ 1;
            }
        }
        Ok(())
    }

    /// Runs the algorithm. Returns `mate[v]`, the vertex matched to `v` or NONE.
    pub(crate) fn solve(mut self) -> Result<Vec<usize>> {
        let n = self.nvertex;
        if self.edges.is_empty() {
            return Ok(vec![NONE; n]);
        }

        // Each stage either augments the matching or proves it maximum.
        for _ in 0..n {
            self.label.fill(FREE);
            self.bestedge.fill(NONE);
            for b in n..2 * n {
                self.blossombestedges[b] = None;
            }
            self.allowedge.fill(false);
            self.queue.clear();

            for v in 0..n {
                if self.mate[v] == NONE && self.label[self.inblossom[v]] == FREE {
                    self.assign_label(v, S_LABEL, NONE);
                }
            }

            let mut augmented = false;
            loop {
                while !augmented {
                    let Some(v) = self.queue.pop() else {
                        break;
                    };
                    for p in self.neighbend[v].clone() {
                        let k = p / 2;
                        let w = self.endpoint[p];
                        if self.inblossom[v] == self.inblossom[w] {
                            continue;
                        }
                        let mut kslack = 0;
                        if !self.allowedge[k] {
                            kslack = self.slack(k);
                            if kslack <= 0 {
                                self.allowedge[k] = true;
                            }
                        }
                        if self.allowedge[k] {
                            if self.label[self.inblossom[w]] == FREE {
                                // Free vertex: label T, its mate S.
                                self.assign_label(w, T_LABEL, p ^ 1);
                            } else if self.label[self.inblossom[w]] == S_LABEL {
                                let base = self.scan_blossom(v, w);
                                if base != NONE {
                                    self.add_blossom(base, k)?;
                                } else {
                                    self.augment_matching(k)?;
                                    augmented = true;
                                    break;
                                }
                            } else if self.label[w] == FREE {
                                // Unreached vertex inside a T-blossom.
                                self.label[w] = T_LABEL;
                                self.labelend[w] = p ^ 1;
                            }
                        } else if self.label[self.inblossom[w]] == S_LABEL {
                            let b = self.inblossom[v];
                            if self.bestedge[b] == NONE || kslack < self.slack(self.bestedge[b]) {
                                self.bestedge[b] = k;
                            }
                        } else if self.label[w] == FREE
                            && (self.bestedge[w] == NONE || kslack < self.slack(self.bestedge[w]))
                        {
                            self.bestedge[w] = k;
                        }
                    }
                }
                if augmented {
                    break;
                }

                match self.next_delta() {
                    Delta::Optimal(delta) => {
                        self.update_duals(delta);
                        break;
                    }
                    Delta::FreeEdge(delta, edge) => {
                        self.update_duals(delta);
                        self.allowedge[edge] = true;
                        let (i, j, _) = self.edges[edge];
                        let s = if self.label[self.inblossom[i]] == FREE { j } else { i };
                        self.queue.push(s);
                    }
                    Delta::SEdge(delta, edge) => {
                        self.update_duals(delta);
                        self.allowedge[edge] = true;
                        self.queue.push(self.edges[edge].0);
                    }
                    Delta::Expand(delta, b) => {
                        self.update_duals(delta);
                        self.expand_blossom(b, false)?;
                    }
                }
            }

            if !augmented {
                break;
            }

            // End of stage: expand S-blossoms whose dual reached zero.
            for b in n..2 * n {
                if self.blossomparent[b] == NONE
                    && self.blossombase[b] != NONE
                    && self.label[b] == S_LABEL
                    && self.dualvar[b] == 0
                {
                    self.expand_blossom(b, true)?;
                }
            }
        }

        let mut mate = vec![NONE; n];
        for (v, m) in mate.iter_mut().enumerate() {
            if self.mate[v] != NONE {
                *m = self.endpoint[self.mate[v]];
            }
        }
        Ok(mate)
    }

    /// Smallest dual adjustment that creates a new tight edge or empties a
    /// T-blossom dual.
    fn next_delta(&self) -> Delta {
        let n = self.nvertex;
        let mut best: Option<Delta> = None;
        let mut consider = |candidate: Delta| {
            if best.as_ref().map_or(true, |b| candidate.amount() < b.amount()) {
                best = Some(candidate);
            }
        };

        // Edge between an S-vertex and a free vertex.
        for v in 0..n {
            if self.label[self.inblossom[v]] == FREE && self.bestedge[v] != NONE {
                consider(Delta::FreeEdge(self.slack(self.bestedge[v]), self.bestedge[v]));
            }
        }
        // Half the slack of an edge between two S-blossoms.
        for b in 0..2 * n {
            if self.blossomparent[b] == NONE && self.label[b] == S_LABEL && self.bestedge[b] != NONE
            {
                consider(Delta::SEdge(self.slack(self.bestedge[b]) / 2, self.bestedge[b]));
            }
        }
        // Dual of a T-blossom.
        for b in n..2 * n {
            if self.blossombase[b] != NONE
                && self.blossomparent[b] == NONE
                && self.label[b] == T_LABEL
            {
                consider(Delta::Expand(self.dualvar[b], b));
            }
        }

        best.unwrap_or_else(|| {
            // No further improvement: make the optimum verifiable.
            let min = self.dualvar[..n].iter().copied().min().unwrap_or(0);
            Delta::Optimal(min.max(0))
        })
    }

    fn update_duals(&mut self, delta: i64) {
        let n = self.nvertex;
        for v in 0..n {
            match self.label[self.inblossom[v]] {
                S_LABEL => self.dualvar[v] -= delta,
                T_LABEL => self.dualvar[v] += delta,
                _ => {}
            }
        }
        for b in n..2 * n {
            if self.blossombase[b] != NONE && self.blossomparent[b] == NONE {
                match self.label[b] {
                    S_LABEL => self.dualvar[b] += delta,
                    T_LABEL => self.dualvar[b] -= delta,
                    _ => {}
                }
            }
        }
    }
}

enum Delta {
    Optimal(i64),
    FreeEdge(i64, usize),
    SEdge(i64, usize),
    Expand(i64, usize),
}

impl Delta {
    fn amount(&self) -> i64 {
        match *self {
            Delta::Optimal(d) | Delta::FreeEdge(d, _) | Delta::SEdge(d, _) | Delta::Expand(d, _) => d,
        }
    }
}

/// Python-style indexing: negative indices count from the end.
fn wrap(v: &[usize], index: isize) -> usize {
    v[index.rem_euclid(v.len() as isize) as usize]
}
