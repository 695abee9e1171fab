//! Code tree for adaptive Huffman coding.
//!
//! The tree is the mutable state that the compressing and expanding sides
//! advance in lockstep.  Nodes live in an arena and refer to each other by
//! index, so the parent back-links do not create ownership cycles.  Every
//! position in the tree carries a node number: the root has the largest,
//! and numbers decrease going down and from right to left among siblings.
//! `update` keeps the sibling property intact by promoting a node to the
//! highest numbered slot in its weight block before incrementing it.

use bit_vec::BitVec;
use crate::Error;
use crate::tools::bit_buffer::BitBuffer;

/// Payload carried by a tree node.
#[derive(Clone,Copy,PartialEq,Debug)]
pub enum NodeData {
    Internal,
    /// the not-yet-transmitted escape leaf
    Nyt,
    /// leaf holding a 0-based alphabet index
    Symbol(u16)
}

struct Node {
    weight: u64,
    /// sorting key tied to the position, not the node
    num: u32,
    data: NodeData,
    parent: Option<usize>,
    left: Option<usize>,
    right: Option<usize>
}

pub struct CodeTree {
    nodes: Vec<Node>,
    root: usize,
    nyt: usize,
    /// map from alphabet index to the leaf holding it
    leaf_of: Vec<Option<usize>>
}

impl CodeTree {
    /// Start as a lone NYT leaf that is also the root.
    pub fn create(alphabet_size: usize) -> Self {
        let mut nodes = Vec::with_capacity(2*alphabet_size - 1);
        nodes.push(Node {
            weight: 0,
            num: (2*alphabet_size - 1) as u32,
            data: NodeData::Nyt,
            parent: None,
            left: None,
            right: None
        });
        Self {
            nodes,
            root: 0,
            nyt: 0,
            leaf_of: vec![None;alphabet_size]
        }
    }
    /// root-to-node bit sequence, 0 = left, 1 = right
    fn path_from_root(&self,node: usize) -> BitVec {
        let mut upward = Vec::new();
        let mut curs = node;
        while let Some(p) = self.nodes[curs].parent {
            upward.push(self.nodes[p].right == Some(curs));
            curs = p;
        }
        let mut path = BitVec::with_capacity(upward.len());
        for &bit in upward.iter().rev() {
            path.push(bit);
        }
        path
    }
    /// Code path for the given symbol.  If the symbol has not appeared yet
    /// the path leads to the NYT leaf and `first_appearance` is true.
    pub fn search_symbol(&self,sym: u16) -> (BitVec,bool) {
        match self.leaf_of[sym as usize] {
            Some(leaf) => (self.path_from_root(leaf),false),
            None => (self.path_from_root(self.nyt),true)
        }
    }
    /// Walk down from the root consuming one bit per level until a leaf.
    pub fn descend(&self,bits: &mut BitBuffer) -> Result<NodeData,Error> {
        let mut curs = self.root;
        loop {
            match (self.nodes[curs].left,self.nodes[curs].right) {
                (Some(l),Some(r)) => {
                    curs = match bits.get_bit()? {
                        true => r,
                        false => l
                    };
                },
                _ => return Ok(self.nodes[curs].data)
            }
        }
    }
    /// Swap the structural positions of two nodes; the numbers stay with
    /// the positions.  Neither may be the root or an ancestor of the other.
    fn exchange(&mut self,x: usize,y: usize) {
        let px = self.nodes[x].parent;
        let py = self.nodes[y].parent;
        if px == py {
            if let Some(p) = px {
                let left = self.nodes[p].left;
                self.nodes[p].left = self.nodes[p].right;
                self.nodes[p].right = left;
            }
        } else {
            if let Some(p) = px {
                if self.nodes[p].left == Some(x) {
                    self.nodes[p].left = Some(y);
                } else {
                    self.nodes[p].right = Some(y);
                }
            }
            if let Some(p) = py {
                if self.nodes[p].left == Some(y) {
                    self.nodes[p].left = Some(x);
                } else {
                    self.nodes[p].right = Some(x);
                }
            }
            self.nodes[x].parent = py;
            self.nodes[y].parent = px;
        }
        let num = self.nodes[x].num;
        self.nodes[x].num = self.nodes[y].num;
        self.nodes[y].num = num;
    }
    /// Position with the largest number among all nodes of this weight.
    /// Scans the whole arena, which stays small (at most 2A-1 nodes).
    fn max_num_in_block(&self,start: usize) -> usize {
        let weight = self.nodes[start].weight;
        let mut best = start;
        for (idx,node) in self.nodes.iter().enumerate() {
            if node.weight == weight && node.num > self.nodes[best].num {
                best = idx;
            }
        }
        best
    }
    /// Split the NYT leaf for a first appearance: the new symbol leaf goes
    /// on the right, a fresh NYT leaf on the left, and the former NYT node
    /// becomes internal.  Returns the former NYT position.
    fn split_nyt(&mut self,sym: u16) -> usize {
        let q = self.nyt;
        let num = self.nodes[q].num;
        let leaf = self.nodes.len();
        self.nodes.push(Node {
            weight: 1,
            num: num - 1,
            data: NodeData::Symbol(sym),
            parent: Some(q),
            left: None,
            right: None
        });
        let nyt = self.nodes.len();
        self.nodes.push(Node {
            weight: 0,
            num: num - 2,
            data: NodeData::Nyt,
            parent: Some(q),
            left: None,
            right: None
        });
        self.nodes[q].data = NodeData::Internal;
        self.nodes[q].left = Some(nyt);
        self.nodes[q].right = Some(leaf);
        self.nyt = nyt;
        self.leaf_of[sym as usize] = Some(leaf);
        q
    }
    /// exchange with the block leader unless it is this node or its
    /// parent, then increment the weight
    fn promote_and_increment(&mut self,curs: usize) {
        let leader = self.max_num_in_block(curs);
        if leader != curs && self.nodes[curs].parent != Some(leader) {
            self.exchange(curs,leader);
        }
        self.nodes[curs].weight += 1;
    }
    /// Incorporate one coded symbol.  Seeds at the symbol's leaf, splitting
    /// the NYT leaf on a first appearance, then walks to the root promoting
    /// and incrementing at every step.
    pub fn update(&mut self,sym: u16,first_appearance: bool) -> Result<(),Error> {
        let mut curs = match first_appearance {
            true => {
                let q = self.split_nyt(sym);
                self.nodes[q].weight += 1;
                q
            },
            false => {
                let leaf = self.leaf_of[sym as usize].ok_or(Error::InvariantViolation)?;
                self.promote_and_increment(leaf);
                leaf
            }
        };
        while let Some(p) = self.nodes[curs].parent {
            self.promote_and_increment(p);
            curs = p;
        }
        Ok(())
    }
    #[cfg(test)]
    pub fn root_weight(&self) -> u64 {
        self.nodes[self.root].weight
    }
    #[cfg(test)]
    pub fn symbol_weight(&self,sym: u16) -> Option<u64> {
        self.leaf_of[sym as usize].map(|leaf| self.nodes[leaf].weight)
    }
    /// Verify the tree-wide invariants, for use in tests.
    #[cfg(test)]
    pub fn check_invariants(&self) -> Result<(),Error> {
        // exactly one NYT leaf, weight 0, smallest number in the tree
        let nyt_count = self.nodes.iter().filter(|n| n.data == NodeData::Nyt).count();
        if nyt_count != 1 || self.nodes[self.nyt].data != NodeData::Nyt {
            return Err(Error::InvariantViolation);
        }
        if self.nodes[self.nyt].weight != 0 {
            return Err(Error::InvariantViolation);
        }
        if self.nodes.iter().any(|n| n.num < self.nodes[self.nyt].num) {
            return Err(Error::InvariantViolation);
        }
        if self.nodes[self.root].parent.is_some() {
            return Err(Error::InvariantViolation);
        }
        if self.nodes.iter().any(|n| n.num > self.nodes[self.root].num) {
            return Err(Error::InvariantViolation);
        }
        // both children or none, reciprocal parent links, weights sum
        for (idx,node) in self.nodes.iter().enumerate() {
            match (node.left,node.right) {
                (Some(l),Some(r)) => {
                    if node.data != NodeData::Internal {
                        return Err(Error::InvariantViolation);
                    }
                    if self.nodes[l].parent != Some(idx) || self.nodes[r].parent != Some(idx) {
                        return Err(Error::InvariantViolation);
                    }
                    if self.nodes[l].weight + self.nodes[r].weight != node.weight {
                        return Err(Error::InvariantViolation);
                    }
                },
                (None,None) => {
                    if node.data == NodeData::Internal {
                        return Err(Error::InvariantViolation);
                    }
                },
                _ => return Err(Error::InvariantViolation)
            }
        }
        // sibling property: ordered by number, weights never decrease and
        // consecutive pairs share a parent
        let mut order: Vec<usize> = (0..self.nodes.len()).collect();
        order.sort_by_key(|idx| self.nodes[*idx].num);
        for win in order.windows(2) {
            if self.nodes[win[0]].weight > self.nodes[win[1]].weight {
                return Err(Error::InvariantViolation);
            }
        }
        for pair in order.chunks(2) {
            if pair.len() == 2 && self.nodes[pair[0]].parent != self.nodes[pair[1]].parent {
                return Err(Error::InvariantViolation);
            }
        }
        // leaf table matches the leaves
        for (sym,entry) in self.leaf_of.iter().enumerate() {
            if let Some(leaf) = entry {
                if self.nodes[*leaf].data != NodeData::Symbol(sym as u16) {
                    return Err(Error::InvariantViolation);
                }
            }
        }
        Ok(())
    }
}

/// feed a symbol sequence through the tree, checking after every update
#[cfg(test)]
fn drive(tree: &mut CodeTree,seq: &[u16]) {
    let mut count = 0;
    for &sym in seq {
        let (_path,first) = tree.search_symbol(sym);
        tree.update(sym,first).expect("update failed");
        count += 1;
        tree.check_invariants().expect("tree invariants broken");
        assert_eq!(tree.root_weight(),count);
    }
}

#[test]
fn fresh_tree() {
    let tree = CodeTree::create(256);
    assert_eq!(tree.root_weight(),0);
    let (path,first) = tree.search_symbol(0x41);
    assert!(first);
    assert_eq!(path.len(),0);
    tree.check_invariants().expect("tree invariants broken");
}

#[test]
fn first_split() {
    let mut tree = CodeTree::create(256);
    tree.update(0x41,true).expect("update failed");
    tree.check_invariants().expect("tree invariants broken");
    assert_eq!(tree.root_weight(),1);
    assert_eq!(tree.symbol_weight(0x41),Some(1));
    let (path,first) = tree.search_symbol(0x41);
    assert!(!first);
    assert_eq!(path.len(),1);
    assert_eq!(path.get(0),Some(true));
}

#[test]
fn repeated_symbol() {
    let mut tree = CodeTree::create(256);
    drive(&mut tree,&[0x41;10]);
    assert_eq!(tree.symbol_weight(0x41),Some(10));
    // repeat codes shrink to the single right-child link
    let (path,_first) = tree.search_symbol(0x41);
    assert_eq!(path.len(),1);
}

#[test]
fn sibling_property_restored() {
    let seq: Vec<u16> = "abracadabra".bytes().map(|b| b as u16).collect();
    let mut tree = CodeTree::create(256);
    drive(&mut tree,&seq);
    assert_eq!(tree.symbol_weight(b'a' as u16),Some(5));
    assert_eq!(tree.symbol_weight(b'b' as u16),Some(2));
    assert_eq!(tree.symbol_weight(b'd' as u16),Some(1));
    // the most frequent symbol gets the shortest code
    let (a_path,_) = tree.search_symbol(b'a' as u16);
    let (d_path,_) = tree.search_symbol(b'd' as u16);
    assert!(a_path.len() < d_path.len());
}

#[test]
fn all_symbols_seen() {
    let seq: Vec<u16> = (0..256).collect();
    let mut tree = CodeTree::create(256);
    drive(&mut tree,&seq);
    for sym in 0..256 {
        assert_eq!(tree.symbol_weight(sym),Some(1));
    }
    // the escape leaf survives even with the alphabet exhausted
    let (_path,first) = tree.search_symbol(0);
    assert!(!first);
}

#[test]
fn descend_mirrors_search() {
    let seq: Vec<u16> = "mississippi".bytes().map(|b| b as u16).collect();
    let mut tree = CodeTree::create(256);
    drive(&mut tree,&seq);
    for sym in [b'm' as u16,b'i' as u16,b's' as u16,b'p' as u16] {
        let (path,first) = tree.search_symbol(sym);
        assert!(!first);
        let mut bits = BitBuffer::new();
        bits.extend(&path);
        assert_eq!(tree.descend(&mut bits).expect("descend failed"),NodeData::Symbol(sym));
    }
}

#[test]
fn unknown_symbol_is_rejected() {
    let mut tree = CodeTree::create(4);
    assert!(matches!(tree.update(2,false),Err(Error::InvariantViolation)));
}
